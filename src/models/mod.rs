mod report;

pub use report::{DEMO_PAYLOAD, MAX_RECORDED_ERRORS, PublishReport};
