//! HTTP serving with a bounded shutdown.
//!
//! When the shutdown signal fires, the listener stops accepting and open
//! connections get until a single deadline (`SHUTDOWN_TIMEOUT_SECS` from the
//! signal) to finish. Connections still open at the deadline are abandoned,
//! and the publish pool then drains in whatever time is left, cancelling
//! the remaining jobs once it runs out. A client that never finishes its
//! request cannot keep the process alive.

use std::future::{Future, IntoFuture};
use std::io;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::routes::build_router;
use crate::state::AppState;

/// Serve the application on `listener` until `signal` resolves.
///
/// `signal` yields a short name for the log line (e.g. `"SIGTERM"`).
///
/// Returns `Ok(true)` when every connection and every publish job finished
/// before the deadline, `Ok(false)` when something had to be abandoned or
/// cancelled. Publish jobs are drained in both cases, and also when the
/// server itself fails, in which case that error is returned.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> io::Result<bool>
where
    F: Future<Output = &'static str> + Send,
{
    let grace = state.config.shutdown_timeout;
    let stop_accepting = CancellationToken::new();
    let stopped = stop_accepting.clone();

    let server = axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(async move { stopped.cancelled().await })
        .into_future();
    tokio::pin!(server);

    let (served, connections_closed, deadline) = tokio::select! {
        result = &mut server => (result, true, Instant::now() + grace),
        name = signal => {
            warn!(signal = name, "Exit command received, initiating graceful shutdown...");
            let deadline = Instant::now() + grace;
            stop_accepting.cancel();

            match tokio::time::timeout_at(deadline, &mut server).await {
                Ok(result) => (result, true, deadline),
                Err(_) => {
                    warn!(
                        grace_ms = grace.as_millis() as u64,
                        "Open connections did not finish in time, abandoning them"
                    );
                    (Ok(()), false, deadline)
                }
            }
        }
    };

    match &served {
        Ok(()) => info!("server closed"),
        Err(e) => error!("Server error: {e}"),
    }

    info!("HTTP server stopped, draining publish jobs...");
    let jobs_finished = state
        .pool
        .shutdown(deadline.saturating_duration_since(Instant::now()))
        .await;

    served.map(|()| connections_closed && jobs_finished)
}

/// Wait for Ctrl+C or SIGTERM and return the signal's name.
///
/// A signal whose handler cannot be installed is logged and never fires;
/// the other one still works.
pub async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    }
}
