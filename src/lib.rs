//! Deterministic cleanup scopes and mutation-restoring patch helpers for
//! tests.
//!
//! The library owns the lifecycle for deferring restore actions inside a
//! test (or nested sub-test) so that every temporary mutation, whether an
//! overwritten value, an environment variable, or a created directory, is
//! undone in strict reverse registration order when the enclosing scope
//! ends. Scopes bind to a host test runner through [`TestHost`]: when the
//! runner offers a native cleanup hook the scope unwinds automatically
//! (hosted mode); otherwise the caller finishes it with [`Scope::done`]
//! (explicit mode).
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use scoped_restore::{PatchSlot, Scope, test_support::RecordingHost};
//!
//! let verbose = PatchSlot::of(false);
//! let scope = Scope::new(Arc::new(RecordingHost::new()));
//! scope.patch(&verbose, true);
//! assert!(verbose.get::<bool>());
//! scope.done();
//! assert!(!verbose.get::<bool>());
//! ```

mod config;
mod env;
mod error;
mod host;
mod observability;
mod patch;
mod scope;
mod stack;
mod temp;
#[doc(hidden)]
pub mod test_support;

pub use config::CleanupCfg;
pub use error::{
    ConfigError, ConfigResult, Result, ScopedRestoreError, TempDirError, TempDirResult,
};
pub use host::{CleanupHook, TestHost};
pub use patch::PatchSlot;
pub use scope::{CleanupFn, DelegationMode, Scope};
pub use stack::RestoreAction;
