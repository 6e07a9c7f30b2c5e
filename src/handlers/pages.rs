//! Static greeting endpoints.
//!
//! - `GET /` - Site greeting, also served for any unmatched path
//! - `GET /hello` - Hello greeting

use tracing::info;

pub const ROOT_BODY: &str = "This is my website!\n";
pub const HELLO_BODY: &str = "Hello, HTTP!\n";

pub async fn root() -> &'static str {
    info!("got / request");
    ROOT_BODY
}

pub async fn hello() -> &'static str {
    info!("got /hello request");
    HELLO_BODY
}
