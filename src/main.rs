use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use counter_producer::{AppState, Config, KafkaPublisher, metrics, server};

/// Exit code when the HTTP listener cannot be started.
const LISTENER_FAILED: exitcode::ExitCode = 1;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("starting server v{} ...", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        port = %config.port,
        kafka = %config.kafka_address,
        topic = %config.topic,
        workers = config.publish_workers,
        "Configuration loaded"
    );

    if let Some(addr) = config.metrics_addr() {
        metrics::try_init_metrics(addr);
    }

    let publisher = KafkaPublisher::new(&config).map_err(|e| {
        error!("{e}");
        exitcode::CONFIG
    })?;

    let addr = config.server_addr();
    let state = AppState::new(Arc::new(publisher), config);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!("error starting server on {addr}: {e}");
        LISTENER_FAILED
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  ANY  /          - Greeting");
    info!("  GET  /hello     - Greeting");
    info!("  POST /producer  - Publish `counter` messages");

    // Stop accepting connections on signal, then drain publish jobs, all
    // within SHUTDOWN_TIMEOUT_SECS
    let served = server::serve(listener, state.clone(), server::shutdown_signal()).await;

    let serve_failed = match served {
        Ok(true) => false,
        Ok(false) => {
            warn!("Shutdown deadline reached, abandoned connections or cancelled jobs");
            false
        }
        Err(_) => true,
    };

    let totals = state.pool.totals();
    info!(
        jobs = totals.jobs_completed,
        sent = totals.messages_sent,
        failed = totals.messages_failed,
        uptime_secs = state.uptime_seconds(),
        "Server shutdown complete"
    );

    if serve_failed {
        return Err(exitcode::SOFTWARE);
    }
    Ok(())
}
