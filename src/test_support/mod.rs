//! Internal helpers re-exported for integration tests.
//!
//! Ships host doubles for exercising both delegation modes: a plain
//! failure-recording host and one exposing a native cleanup hook that the
//! test fires by hand. Tracing capture helpers are additionally available
//! to the crate's own unit tests.

mod hosts;
#[cfg(test)]
mod logging;

pub use hosts::{NativeCleanupHost, RecordingHost};
#[cfg(test)]
pub(crate) use logging::{capture_logs, capture_warn_logs};
