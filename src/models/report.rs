use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Payload carried by every published message.
pub const DEMO_PAYLOAD: &[u8] = br#"{ title: "mytitle", body:"my message"}"#;

/// Upper bound on failure causes kept in a single report.
///
/// `failed` still counts every failure; only the stored messages are capped.
pub const MAX_RECORDED_ERRORS: usize = 16;

/// Outcome of one publish job.
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Job identifier, also attached to the job's log span
    pub job_id: Uuid,
    /// Number of messages the request asked for
    pub requested: u64,
    /// Publish calls actually issued
    pub attempted: u64,
    /// Calls that returned success
    pub sent: u64,
    /// Calls that returned an error
    pub failed: u64,
    /// First few failure causes, in order of occurrence
    pub errors: Vec<String>,
    /// Set when shutdown cut the job short
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PublishReport {
    /// Start an empty report for a job of `requested` messages.
    pub fn new(job_id: Uuid, requested: u64) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            requested,
            attempted: 0,
            sent: 0,
            failed: 0,
            errors: Vec::new(),
            cancelled: false,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.sent += 1;
    }

    pub fn record_failure(&mut self, cause: impl ToString) {
        self.attempted += 1;
        self.failed += 1;
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(cause.to_string());
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    /// Whether every requested message was published.
    pub fn is_complete_success(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.sent == self.requested
    }
}
