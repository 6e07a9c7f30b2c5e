//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener when `METRICS_PORT` is
//! non-zero. Recording functions are safe to call whether or not the
//! exporter was installed.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `producer_messages_published_total` - Publish calls (labels: topic, status)
//! - `producer_publish_jobs_total` - Finished jobs (label: outcome)
//!
//! ## Histograms
//! - `producer_publish_duration_seconds` - Duration of a single publish call
//!
//! ## Gauges
//! - `producer_publish_jobs_in_flight` - Jobs currently holding a worker slot

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const MESSAGES_PUBLISHED_TOTAL: &str = "producer_messages_published_total";
    pub const PUBLISH_JOBS_TOTAL: &str = "producer_publish_jobs_total";
    pub const PUBLISH_DURATION_SECONDS: &str = "producer_publish_duration_seconds";
    pub const PUBLISH_JOBS_IN_FLIGHT: &str = "producer_publish_jobs_in_flight";
}

/// Initialize the Prometheus metrics exporter on `metrics_addr`.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::MESSAGES_PUBLISHED_TOTAL,
        "Total number of publish calls made to Kafka"
    );
    describe_counter!(
        names::PUBLISH_JOBS_TOTAL,
        "Total number of publish jobs finished"
    );
    describe_histogram!(
        names::PUBLISH_DURATION_SECONDS,
        "Single message publish duration in seconds"
    );
    describe_gauge!(
        names::PUBLISH_JOBS_IN_FLIGHT,
        "Publish jobs currently running"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record one publish call.
pub fn record_message_published(topic: &str, status: &str) {
    counter!(names::MESSAGES_PUBLISHED_TOTAL, "topic" => topic.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Record a finished job by outcome (`complete`, `partial`, `cancelled`).
pub fn record_publish_job(outcome: &str) {
    counter!(names::PUBLISH_JOBS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

/// Record the duration of a single publish call.
pub fn record_publish_duration(topic: &str, duration_secs: f64) {
    histogram!(names::PUBLISH_DURATION_SECONDS, "topic" => topic.to_string())
        .record(duration_secs);
}

/// Move the in-flight jobs gauge by `delta`.
pub fn adjust_jobs_in_flight(delta: f64) {
    let gauge = gauge!(names::PUBLISH_JOBS_IN_FLIGHT);
    if delta >= 0.0 {
        gauge.increment(delta);
    } else {
        gauge.decrement(-delta);
    }
}
