//! Publishers shared by the HTTP test suites.
#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use counter_producer::{MessagePublisher, PublishError};

/// Records every payload; fails calls whose index is in `fail_on`.
///
/// When `gated` is set, each call waits for a permit from `gate` before
/// returning, which lets a test hold publishing back.
pub struct FakePublisher {
    pub calls: AtomicUsize,
    pub payloads: Mutex<Vec<Vec<u8>>>,
    pub fail_on: Vec<usize>,
    pub gated: bool,
    pub gate: Semaphore,
}

impl FakePublisher {
    fn with(fail_on: Vec<usize>, gated: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            payloads: Mutex::new(Vec::new()),
            fail_on,
            gated,
            gate: Semaphore::new(0),
        }
    }

    pub fn new() -> Self {
        Self::with(Vec::new(), false)
    }

    pub fn gated() -> Self {
        Self::with(Vec::new(), true)
    }

    pub fn failing_on(fail_on: Vec<usize>) -> Self {
        Self::with(fail_on, false)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Let `n` gated calls through.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl MessagePublisher for FakePublisher {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        if self.gated
            && let Ok(permit) = self.gate.acquire().await
        {
            permit.forget();
        }

        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut payloads) = self.payloads.lock() {
            payloads.push(payload.to_vec());
        }

        if self.fail_on.contains(&index) {
            return Err(PublishError::Unavailable(format!("call {index} refused")));
        }
        Ok(())
    }

    fn destination(&self) -> &str {
        "fake-topic"
    }
}
