use crate::error::{AppError, AppResult};

/// Parse the `counter` form value.
///
/// Accepts an optional leading `+` or `-` followed by decimal digits that fit
/// in a signed 64-bit integer. Surrounding whitespace, an empty string and
/// anything else are rejected.
pub fn parse_counter(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidCounter(raw.to_string()))
}

/// Number of messages to publish for a parsed counter.
///
/// Negative counters publish nothing.
pub fn publish_count(counter: i64) -> u64 {
    u64::try_from(counter).unwrap_or(0)
}
