//! Scope controllers that own deferred restore actions.
//!
//! A [`Scope`] is bound to one test (or sub-test) lifetime. Its delegation
//! mode is decided once, at construction, by probing the host for a native
//! cleanup hook: hosted scopes unwind automatically when the hook fires,
//! explicit scopes require [`Scope::done`]. Child scopes keep wholly
//! separate stacks; nesting only decides *when* in the parent's timeline a
//! child's unwind runs.

use std::any::type_name;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;

use crate::config::CleanupCfg;
use crate::env;
use crate::error::Result;
use crate::host::TestHost;
use crate::observability::LOG_TARGET;
use crate::patch::PatchSlot;
use crate::stack::{RestoreAction, RestoreStack};
use crate::temp;

/// Replaceable registration strategy for patch-primitive restore actions.
///
/// The default strategy defers the action onto the receiving scope's own
/// stack. Installing a custom strategy with [`Scope::set_cleanup`] lets a
/// caller observe or redirect every restore registration made by the patch
/// primitives for that scope and the children created after it.
pub type CleanupFn = Arc<dyn Fn(&Scope, RestoreAction) + Send + Sync>;

/// How a scope's stack is finalised.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DelegationMode {
    /// The caller finalises the scope with [`Scope::done`].
    Explicit,
    /// A host cleanup hook, or the parent scope's unwind, finalises the
    /// stack; no explicit finish call is required.
    Hosted,
}

/// One bounded cleanup lifetime bound to a host test runner.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use scoped_restore::{Scope, test_support::RecordingHost};
///
/// let scope = Scope::new(Arc::new(RecordingHost::new()));
/// scope.set_env("SCOPED_RESTORE_DOC_GREETING", "hello");
/// scope.done(); // the variable is unset again
/// assert!(std::env::var_os("SCOPED_RESTORE_DOC_GREETING").is_none());
/// ```
pub struct Scope {
    host: Arc<dyn TestHost>,
    stack: Arc<RestoreStack>,
    mode: DelegationMode,
    cleanup: Mutex<CleanupFn>,
    cfg: CleanupCfg,
    depth: usize,
}

impl Scope {
    /// Creates a root scope bound to `host`.
    ///
    /// The host is probed once for a native cleanup hook: when present the
    /// scope is hosted and its unwind is registered with the hook
    /// immediately; otherwise the scope is explicit and the caller must
    /// finish it with [`Self::done`]. Cleanup configuration is loaded from
    /// the environment; an invalid configuration is reported through the
    /// host's failure sink and defaults apply.
    #[must_use]
    pub fn new(host: Arc<dyn TestHost>) -> Self {
        let cfg = CleanupCfg::load().unwrap_or_else(|err| {
            host.report_failure(&format!(
                "cleanup configuration invalid, using defaults: {err}"
            ));
            CleanupCfg::default()
        });
        Self::with_config(host, cfg)
    }

    /// Creates a root scope with explicit cleanup configuration.
    #[must_use]
    pub fn with_config(host: Arc<dyn TestHost>, cfg: CleanupCfg) -> Self {
        let stack = Arc::new(RestoreStack::default());
        let mode = host.cleanup_hook().map_or(DelegationMode::Explicit, |hook| {
            let trigger = Arc::clone(&stack);
            hook.register(Box::new(move || {
                trigger.unwind();
            }));
            DelegationMode::Hosted
        });
        tracing::debug!(target: LOG_TARGET, mode = ?mode, "opened restore scope");
        Self {
            host,
            stack,
            mode,
            cleanup: Mutex::new(default_cleanup()),
            cfg,
            depth: 0,
        }
    }

    /// Returns the scope's delegation mode.
    #[must_use]
    pub const fn mode(&self) -> DelegationMode {
        self.mode
    }

    /// Returns the cleanup configuration in effect for this scope.
    #[must_use]
    pub const fn config(&self) -> &CleanupCfg {
        &self.cfg
    }

    /// Registers `action` to run when this scope unwinds, after all actions
    /// registered later.
    ///
    /// # Panics
    /// Panics when the scope has already completed.
    pub fn defer(&self, action: impl FnOnce() + Send + 'static) {
        self.defer_boxed(Box::new(action));
    }

    /// Unwinds the scope's stack.
    ///
    /// In explicit mode this is the mandatory finish call. In hosted mode
    /// it is optional: calling it unwinds early and the host hook firing
    /// later finds a sealed stack and does nothing, so the actions run
    /// exactly once however many triggers fire.
    ///
    /// # Panics
    /// Panics when an explicit scope is finished twice.
    pub fn done(&self) {
        let ran = self.stack.unwind();
        assert!(
            ran || self.mode == DelegationMode::Hosted,
            "Done called twice on the same scope"
        );
    }

    /// Creates a child scope inheriting this scope's delegation mode,
    /// cleanup strategy, and configuration.
    ///
    /// A hosted child is hosted on its parent: the child's unwind is
    /// deferred onto the parent's stack at the creation point, so a child
    /// that is never finished explicitly unwinds as one indivisible unit
    /// exactly between the parent actions registered either side of it. An
    /// explicit child must be finished with [`Self::done`].
    ///
    /// # Panics
    /// Panics when the parent scope has already completed.
    #[must_use]
    pub fn subscope(&self) -> Self {
        let stack = Arc::new(RestoreStack::default());
        if self.mode == DelegationMode::Hosted {
            let trigger = Arc::clone(&stack);
            self.defer_boxed(Box::new(move || {
                trigger.unwind();
            }));
        }
        Self {
            host: Arc::clone(&self.host),
            stack,
            mode: self.mode,
            cleanup: Mutex::new(self.cleanup_fn()),
            cfg: self.cfg.clone(),
            depth: self.depth + 1,
        }
    }

    /// Runs `body` inside a child scope and finalises the child before
    /// returning, in every delegation mode.
    ///
    /// The child's entire unwind therefore completes before control returns
    /// to the caller; any trigger embedded in this scope's stack for the
    /// child becomes an inert no-op.
    pub fn run<R>(&self, body: impl FnOnce(&Self) -> R) -> R {
        let child = self.subscope();
        let result = body(&child);
        child.stack.unwind();
        result
    }

    /// Replaces the restore-registration strategy used by the patch
    /// primitives for this scope and for children created afterwards.
    pub fn set_cleanup<F>(&self, cleanup: F)
    where
        F: Fn(&Self, RestoreAction) + Send + Sync + 'static,
    {
        *self
            .cleanup
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Arc::new(cleanup);
    }

    /// Temporarily replaces the value held by `slot`, restoring the
    /// original value (the same allocation, not a clone) when the scope
    /// unwinds.
    ///
    /// # Panics
    /// Panics when `new_value`'s type does not match the slot's type,
    /// naming both types, and when the scope has already completed.
    pub fn patch<T: std::any::Any + Send>(&self, slot: &PatchSlot, new_value: T) {
        let prior = slot.swap_checked(Box::new(new_value), type_name::<T>());
        let restored = slot.clone();
        self.queue_restore(Box::new(move || restored.put(prior)));
    }

    /// Sets the environment variable `name` to `value`, restoring the
    /// exact prior state (previous value, or unset) when the scope unwinds.
    ///
    /// # Panics
    /// Panics when the scope has already completed.
    pub fn set_env(&self, name: impl AsRef<OsStr>, value: impl AsRef<OsStr>) {
        self.apply_env(name.as_ref(), Some(value.as_ref()));
    }

    /// Removes the environment variable `name`, restoring the prior value
    /// when one existed; when the variable was already unset the restore is
    /// a no-op.
    ///
    /// # Panics
    /// Panics when the scope has already completed.
    pub fn unset_env(&self, name: impl AsRef<OsStr>) {
        self.apply_env(name.as_ref(), None);
    }

    /// Creates a fresh, uniquely named temporary directory and registers
    /// its best-effort removal for unwind time.
    ///
    /// The directory lands under [`CleanupCfg::temp_root`] when configured,
    /// the system temporary directory otherwise. Removal failures are
    /// reported through the host's failure sink without interrupting the
    /// unwind, and [`CleanupCfg::retain_temp_dirs`] keeps the tree in place
    /// for inspection.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created.
    pub fn mkdir_temp(&self) -> Result<Utf8PathBuf> {
        let path = temp::create_temp_dir(&self.cfg)?;
        let retain = self.cfg.retain_temp_dirs;
        let host = Arc::clone(&self.host);
        let dir = path.clone();
        self.queue_restore(Box::new(move || {
            temp::remove_temp_dir(&dir, retain, host.as_ref());
        }));
        Ok(path)
    }

    fn apply_env(&self, name: &OsStr, value: Option<&OsStr>) {
        let previous = env::apply(name, value);
        let name = name.to_owned();
        self.queue_restore(Box::new(move || {
            env::restore(&name, previous.as_deref());
        }));
    }

    fn defer_boxed(&self, action: RestoreAction) {
        self.stack.push(action);
    }

    fn queue_restore(&self, action: RestoreAction) {
        let cleanup = self.cleanup_fn();
        cleanup(self, action);
    }

    fn cleanup_fn(&self) -> CleanupFn {
        Arc::clone(
            &self
                .cleanup
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.mode == DelegationMode::Hosted || self.stack.is_sealed() || self.stack.is_empty() {
            return;
        }
        if std::thread::panicking() {
            // The test is already failing; restore what we can rather than
            // escalating to an abort.
            let stack = Arc::clone(&self.stack);
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                stack.unwind();
            }));
            if outcome.is_err() {
                tracing::warn!(
                    target: LOG_TARGET,
                    depth = self.depth,
                    "restore action panicked while unwinding an abandoned scope"
                );
            }
            return;
        }
        panic!("Done not called after Defer");
    }
}

fn default_cleanup() -> CleanupFn {
    Arc::new(|scope: &Scope, action: RestoreAction| scope.defer_boxed(action))
}
