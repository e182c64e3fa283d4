//! Per-scope stack of deferred restore actions.
//!
//! Each scope owns one stack. Actions accumulate while the scope's body
//! runs and are consumed exactly once, in reverse registration order, when
//! the scope finalises. Registration closes before the first action runs,
//! and a completed stack stays inert so racing triggers (an explicit finish
//! call and a host hook, say) cannot run the actions twice.

use std::sync::Mutex;

use crate::observability::LOG_TARGET;

/// Boxed zero-argument restore action.
pub type RestoreAction = Box<dyn FnOnce() + Send>;

/// Ordered collection of restore actions with a sealed terminal state.
#[derive(Default)]
pub(crate) struct RestoreStack {
    state: Mutex<StackState>,
}

#[derive(Default)]
struct StackState {
    actions: Vec<RestoreAction>,
    sealed: bool,
}

impl RestoreStack {
    /// Appends `action` to the stack.
    ///
    /// Panics when the stack has already unwound; registering cleanup work
    /// on a completed scope is a contract violation, not a runtime
    /// condition to recover from.
    pub(crate) fn push(&self, action: RestoreAction) {
        let mut state = self.lock();
        assert!(
            !state.sealed,
            "Defer called after Done: the scope has already completed"
        );
        state.actions.push(action);
    }

    /// Runs every registered action exactly once, most recent first.
    ///
    /// Returns `true` when this call performed the unwind and `false` when
    /// the stack was already sealed. Registration closes before the first
    /// action executes, so an action attempting to defer more work panics.
    pub(crate) fn unwind(&self) -> bool {
        let drained = {
            let mut state = self.lock();
            if state.sealed {
                return false;
            }
            state.sealed = true;
            std::mem::take(&mut state.actions)
        };
        tracing::debug!(
            target: LOG_TARGET,
            actions = drained.len(),
            "unwinding restore scope"
        );
        run_actions(drained);
        true
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().actions.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StackState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Drains `actions` last-pushed-first, completing the drain even when an
/// action panics: the guard's drop runs the remainder before the panic
/// continues outward.
fn run_actions(actions: Vec<RestoreAction>) {
    struct Drain(Vec<RestoreAction>);

    impl Drop for Drain {
        fn drop(&mut self) {
            while let Some(action) = self.0.pop() {
                action();
            }
        }
    }

    let mut remaining = Drain(actions);
    while let Some(action) = remaining.0.pop() {
        action();
    }
}
