//! Shared application state for Axum handlers.
//!
//! Everything a handler needs is injected here at startup; nothing is
//! reached through globals. The state is cheap to clone: the publish pool
//! and configuration are shared behind `Arc`s.

use std::sync::Arc;
use std::time::Instant;

use crate::broker::MessagePublisher;
use crate::config::Config;
use crate::services::PublishPool;

/// Shared application state for Axum handlers.
///
/// # Lifecycle
///
/// `server::serve` drains the publish pool itself. When the router is driven
/// some other way, call `shutdown()` afterwards so in-flight publish jobs get
/// their grace period:
///
/// ```rust,ignore
/// let state = AppState::new(publisher, config);
/// let app = build_router(state.clone());
/// // ... drive `app` ...
/// state.shutdown().await;
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Pool running publish jobs against the shared publisher
    pub pool: PublishPool,
    /// Application configuration
    pub config: Arc<Config>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Create state around an already-constructed publisher.
    pub fn new(publisher: Arc<dyn MessagePublisher>, config: Config) -> Self {
        let pool = PublishPool::new(publisher, config.publish_workers);

        Self {
            pool,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Drain the publish pool within the configured shutdown timeout.
    ///
    /// Returns `true` if no job had to be cancelled.
    pub async fn shutdown(&self) -> bool {
        self.pool.shutdown(self.config.shutdown_timeout).await
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
