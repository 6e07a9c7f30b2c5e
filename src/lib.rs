//! # Counter Producer
//!
//! A small Axum service that publishes a requested number of identical
//! messages to a Kafka topic:
//!
//! - **Fire and acknowledge**: `POST /producer` answers before publishing
//! - **Bounded background work**: jobs run on a tracked, size-limited pool
//! - **Aggregated outcomes**: every job produces a `PublishReport`
//! - **Graceful shutdown**: in-flight jobs get a grace period, then cancel
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (/, /hello, /producer)                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PublishPool (TaskTracker + Semaphore + CancellationToken)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MessagePublisher → KafkaPublisher (round-robin partitions) │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Kafka broker                                               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use counter_producer::{AppState, Config, KafkaPublisher, server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let publisher = Arc::new(KafkaPublisher::new(&config)?);
//!
//!     let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
//!     let state = AppState::new(publisher, config);
//!
//!     server::serve(listener, state, server::shutdown_signal()).await?;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod validation;

// Re-exports for convenience
pub use broker::{KafkaPublisher, MessagePublisher, PublishError};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use services::{PublishPool, PublishTicket};
pub use state::AppState;
