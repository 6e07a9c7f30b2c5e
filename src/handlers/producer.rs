//! `POST /producer` - publish `counter` copies of the demo message.
//!
//! The form field `counter` must be a decimal integer. Url-encoded and
//! multipart bodies are both read; only the first `counter` counts. On success
//! the job is handed to the publish pool and the response goes out at once;
//! the client learns nothing about whether the messages were delivered.
//!
//! ```text
//! curl -d counter=5 http://localhost:3333/producer
//! Producer, counter=5
//! ```

use axum::extract::State;
use tracing::{info, instrument, warn};

use super::CounterField;
use crate::error::AppResult;
use crate::state::AppState;
use crate::validation::{parse_counter, publish_count};

#[instrument(skip_all)]
pub async fn produce(
    State(state): State<AppState>,
    CounterField(raw): CounterField,
) -> AppResult<String> {
    info!("got /producer request");

    // A missing field reads as an empty, unparsable counter.
    let raw = raw.unwrap_or_default();

    let counter = parse_counter(&raw).inspect_err(|e| warn!("Failed to convert count: {e}"))?;

    let ticket = state.pool.submit(publish_count(counter))?;
    info!(job_id = %ticket.job_id, counter, "Publish job accepted");

    Ok(format!("Producer, counter={counter}\n"))
}
