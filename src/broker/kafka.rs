//! rdkafka-backed publisher bound to a single topic.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::{MessagePublisher, PublishError, RoundRobin};
use crate::config::Config;
use crate::error::AppResult;

/// How long a failed partition lookup is remembered before the next attempt.
const LOOKUP_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Remembers the last failed partition lookup so sends skip the blocking
/// metadata call for `period` after it.
struct LookupBackoff {
    failed_at: Mutex<Option<Instant>>,
    period: Duration,
}

impl LookupBackoff {
    fn new(period: Duration) -> Self {
        Self {
            failed_at: Mutex::new(None),
            period,
        }
    }

    fn is_waiting(&self, now: Instant) -> bool {
        let failed_at = self.failed_at.lock().unwrap_or_else(PoisonError::into_inner);
        failed_at.is_some_and(|at| now.saturating_duration_since(at) < self.period)
    }

    fn record_failure(&self, now: Instant) {
        *self.failed_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);
    }
}

/// Long-lived Kafka producer for one broker address and one topic.
///
/// Messages are spread over the topic's partitions with [`RoundRobin`].
/// The partition count is looked up from broker metadata on first use and
/// cached for the life of the process. Until a lookup succeeds, partition
/// choice is left to librdkafka; after a failed lookup the next one is
/// attempted no sooner than 30 seconds later.
///
/// No per-message timeout is configured here, so the client library's own
/// `message.timeout.ms` default applies.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
    balancer: RoundRobin,
    partitions: OnceCell<i32>,
    lookup_backoff: LookupBackoff,
    metadata_timeout: Duration,
}

impl KafkaPublisher {
    /// Build a producer from configuration.
    ///
    /// Creating the producer does not contact the broker, so an unreachable
    /// broker only shows up later as failed sends.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Producer` if librdkafka rejects the client
    /// configuration.
    #[instrument(skip(config), fields(kafka = %config.kafka_address, topic = %config.topic))]
    pub fn new(config: &Config) -> AppResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka_address)
            .set("client.id", env!("CARGO_PKG_NAME"))
            .create()?;

        info!("Kafka producer created");

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            balancer: RoundRobin::new(),
            partitions: OnceCell::new(),
            lookup_backoff: LookupBackoff::new(LOOKUP_RETRY_AFTER),
            metadata_timeout: config.metadata_timeout,
        })
    }

    /// Resolve the partition for the next message, if the count is known.
    async fn next_partition(&self) -> Option<i32> {
        let lookup = self.partitions.get_or_try_init(|| async {
            if self.lookup_backoff.is_waiting(Instant::now()) {
                return Err(PublishError::Unavailable(
                    "waiting to retry partition lookup".to_string(),
                ));
            }
            self.fetch_partition_count()
                .await
                .inspect_err(|_| self.lookup_backoff.record_failure(Instant::now()))
        });

        let partitions = match lookup.await {
            Ok(count) => *count,
            Err(e) => {
                debug!(topic = %self.topic, error = %e, "Partition count unavailable");
                return None;
            }
        };
        self.balancer.next(partitions)
    }

    /// Ask the broker how many partitions the topic has.
    ///
    /// `fetch_metadata` blocks the calling thread, so it runs on the
    /// blocking pool.
    async fn fetch_partition_count(&self) -> Result<i32, PublishError> {
        let producer = self.producer.clone();
        let topic = self.topic.clone();
        let timeout = self.metadata_timeout;

        let metadata = tokio::task::spawn_blocking(move || {
            producer.client().fetch_metadata(Some(topic.as_str()), timeout)
        })
        .await
        .map_err(|e| PublishError::Unavailable(format!("metadata task failed: {e}")))??;

        let count = metadata
            .topics()
            .iter()
            .find(|t| t.name() == self.topic && t.error().is_none())
            .map(|t| t.partitions().len())
            .unwrap_or(0);

        match i32::try_from(count) {
            Ok(n) if n > 0 => {
                info!(topic = %self.topic, partitions = n, "Resolved topic partitions");
                Ok(n)
            }
            _ => Err(PublishError::Unavailable(format!(
                "topic {} reported {count} partitions",
                self.topic
            ))),
        }
    }
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        let partition = self.next_partition().await;

        let mut record: FutureRecord<'_, (), [u8]> = FutureRecord::to(&self.topic).payload(payload);
        if let Some(partition) = partition {
            record = record.partition(partition);
        }

        self.producer
            .send(record, Timeout::Never)
            .await
            .map(|_| ())
            .map_err(|(e, _)| PublishError::Kafka(e))
    }

    fn destination(&self) -> &str {
        &self.topic
    }
}
