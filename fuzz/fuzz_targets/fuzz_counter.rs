//! Fuzz testing for `counter` parsing.
//!
//! Checks that arbitrary form values never panic the parser and that every
//! accepted value round-trips through its decimal form.
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_counter -- -max_total_time=60
//! ```

#![no_main]

use counter_producer::validation::{parse_counter, publish_count};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(n) = parse_counter(s) {
            assert_eq!(parse_counter(&n.to_string()).ok(), Some(n));
            assert_eq!(publish_count(n), u64::try_from(n).unwrap_or(0));
        }
    }
});
