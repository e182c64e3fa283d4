//! Shared tracing configuration for observability instrumentation.
//!
//! Centralises the log target used by the crate so subscribers can filter
//! scope and restoration events without pulling in unrelated application
//! logs.

/// Target used by cleanup spans and logs.
pub(crate) const LOG_TARGET: &str = "scoped_restore::cleanup";
