//! Binding to the host test runner.
//!
//! The engine needs two things from whatever runs the tests: somewhere to
//! report failures, and, when the runner has one, a native hook that fires
//! callbacks once the enclosing test completes. The hook is probed exactly
//! once, when a root scope is constructed, to select the scope's delegation
//! mode.

use crate::stack::RestoreAction;

/// Native cleanup-registration capability offered by a test runner.
///
/// Implementations are expected to invoke registered callbacks in reverse
/// registration order when the enclosing test finishes, as `testing.T`-style
/// runners do.
pub trait CleanupHook {
    /// Registers `action` to run when the host finishes the current test.
    fn register(&self, action: RestoreAction);
}

/// Handle to the host test runner.
///
/// # Examples
/// ```
/// use scoped_restore::TestHost;
///
/// struct StderrHost;
///
/// impl TestHost for StderrHost {
///     fn report_failure(&self, message: &str) {
///         tracing::error!("{message}");
///     }
/// }
/// ```
pub trait TestHost: Send + Sync {
    /// Reports a failure diagnostic to the host runner.
    ///
    /// Used for conditions that must not abort an unwind, such as a
    /// best-effort temporary-directory removal failing.
    fn report_failure(&self, message: &str);

    /// Returns the runner's native cleanup hook, when it has one.
    ///
    /// Returning `Some` places scopes bound to this host in hosted mode:
    /// their stacks unwind automatically when the hook fires and no explicit
    /// finish call is required.
    fn cleanup_hook(&self) -> Option<&dyn CleanupHook> {
        None
    }
}
