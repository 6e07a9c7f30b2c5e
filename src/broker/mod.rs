//! Message broker access behind a small publishing seam.
//!
//! Handlers and the publish pool only ever see [`MessagePublisher`]. The
//! production implementation is [`KafkaPublisher`]; tests substitute their
//! own recording or failing publishers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KafkaPublisher                         │
//! │  ┌─────────────────┐  ┌──────────────────────────────────┐  │
//! │  │ RoundRobin      │  │ FutureProducer (rdkafka)         │  │
//! │  │ - next()        │  │ - one topic                      │  │
//! │  │                 │  │ - cached partition count         │  │
//! │  └─────────────────┘  └──────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! - `balancer` - Round-robin partition selection
//! - `kafka` - rdkafka-backed publisher

mod balancer;
mod kafka;

use async_trait::async_trait;
use thiserror::Error;

pub use balancer::RoundRobin;
pub use kafka::KafkaPublisher;

/// Failure of a single publish call.
///
/// These never reach an HTTP client; they are logged and aggregated into a
/// [`PublishReport`](crate::models::PublishReport).
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Kafka delivery failed: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Publisher unavailable: {0}")]
    Unavailable(String),
}

/// Something that can publish one payload to a fixed destination.
///
/// Implementations must be safe to call from many publish jobs at once;
/// callers never lock around `publish`.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish one message carrying `payload`.
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError>;

    /// Human-readable destination, used as a log and metric label.
    fn destination(&self) -> &str;
}
