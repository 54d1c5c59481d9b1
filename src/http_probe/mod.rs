pub mod classify;
pub mod probe;
pub mod request;
pub mod result;

pub mod prelude {
    pub use super::classify::{Expectation, classify};
    pub use super::probe::{execute, probe_client};
    pub use super::request::build_request;
    pub use super::result::{Exchange, Measurement, ProbeOutcome, StatusClassification};
}

use std::fmt::Write;

/// Renders an error together with its chain of sources.
fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, "\n\nCaused by: {}", src);
        err = src;
    }
    s
}
