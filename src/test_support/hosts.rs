//! Host doubles for exercising delegation modes.

use std::sync::Mutex;

use crate::host::{CleanupHook, TestHost};
use crate::stack::RestoreAction;

/// Host with a failure sink and no native cleanup hook.
///
/// Scopes bound to it run in explicit mode and must be finished with
/// `done()`.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use scoped_restore::{Scope, test_support::RecordingHost};
///
/// let host = Arc::new(RecordingHost::new());
/// let scope = Scope::new(Arc::clone(&host) as Arc<dyn scoped_restore::TestHost>);
/// scope.done();
/// assert!(host.failures().is_empty());
/// ```
#[derive(Default)]
pub struct RecordingHost {
    failures: Mutex<Vec<String>>,
}

impl RecordingHost {
    /// Creates a host with an empty failure log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Returns the failure messages reported so far.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl TestHost for RecordingHost {
    fn report_failure(&self, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.to_owned());
    }
}

/// Host exposing a native cleanup hook, fired by hand from a test.
///
/// Registered callbacks run in reverse registration order, matching the
/// behaviour of `testing.T`-style runners. Scopes bound to it run in
/// hosted mode.
#[derive(Default)]
pub struct NativeCleanupHost {
    failures: Mutex<Vec<String>>,
    cleanups: Mutex<Vec<RestoreAction>>,
}

impl NativeCleanupHost {
    /// Creates a host with no registered cleanups.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            failures: Mutex::new(Vec::new()),
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Runs the registered cleanups, most recently registered first.
    ///
    /// The lock is released between callbacks so a callback may itself
    /// register further cleanup work; anything added runs in the same
    /// firing pass. A second call finds the list empty and returns.
    pub fn fire(&self) {
        loop {
            let next = self
                .cleanups
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .pop();
            match next {
                Some(action) => action(),
                None => break,
            }
        }
    }

    /// Returns the failure messages reported so far.
    #[must_use]
    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of callbacks currently awaiting [`Self::fire`].
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cleanups
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl TestHost for NativeCleanupHost {
    fn report_failure(&self, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.to_owned());
    }

    fn cleanup_hook(&self) -> Option<&dyn CleanupHook> {
        Some(self)
    }
}

impl CleanupHook for NativeCleanupHost {
    fn register(&self, action: RestoreAction) {
        self.cleanups
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(action);
    }
}
