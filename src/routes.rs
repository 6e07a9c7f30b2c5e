//! Application routing.
//!
//! # Routes
//!
//! - `/` - Greeting for any method (also the fallback for unmatched paths)
//! - `GET /hello` - Greeting
//! - `POST /producer` - Publish `counter` messages
//!
//! The only layer is `tower_http` request tracing.

use axum::Router;
use axum::routing::{any, get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(handlers::root))
        .route("/hello", get(handlers::hello))
        .route("/producer", post(handlers::produce))
        .fallback(handlers::root)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
