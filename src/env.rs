//! Serialised environment-variable mutation with exact-state capture.
//!
//! Environment variables are process-wide mutable state, so every mutation
//! and restoration performed by the engine goes through one global lock.
//! The lock covers individual operations only; callers remain responsible
//! for not racing unrelated scopes over the same variable.

use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

use crate::observability::LOG_TARGET;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Applies `value` to `name` (`Some` sets, `None` removes) and returns the
/// prior state: `Some` with the previous value when the variable was set,
/// `None` when it was unset.
pub(crate) fn apply(name: &OsStr, value: Option<&OsStr>) -> Option<OsString> {
    debug_assert!(
        !name.is_empty() && !name.to_string_lossy().contains('='),
        "invalid env var name"
    );
    let _guard = lock_env();
    let previous = env::var_os(name);
    set_or_remove(name, value);
    tracing::debug!(
        target: LOG_TARGET,
        name = %name.to_string_lossy(),
        action = if value.is_some() { "set" } else { "unset" },
        previously_set = previous.is_some(),
        "applied environment variable"
    );
    previous
}

/// Reinstates the captured prior state of `name`.
pub(crate) fn restore(name: &OsStr, previous: Option<&OsStr>) {
    let _guard = lock_env();
    set_or_remove(name, previous);
    tracing::debug!(
        target: LOG_TARGET,
        name = %name.to_string_lossy(),
        restored_to_set = previous.is_some(),
        "restored environment variable"
    );
}

fn set_or_remove(name: &OsStr, value: Option<&OsStr>) {
    match value {
        Some(new_value) => unsafe {
            // SAFETY: `ENV_LOCK` serialises changes, and restoration
            // rewrites the recorded values under the same lock.
            env::set_var(name, new_value);
        },
        None => unsafe {
            // SAFETY: `ENV_LOCK` serialises changes, and restoration
            // rewrites the recorded values under the same lock.
            env::remove_var(name);
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, restore};

    use std::env;
    use std::ffi::OsStr;

    #[test]
    fn apply_reports_prior_unset_state() {
        let name = OsStr::new("SCOPED_RESTORE_UNIT_UNSET");
        let previous = apply(name, Some(OsStr::new("one")));
        assert!(previous.is_none());
        assert_eq!(env::var(name).as_deref(), Ok("one"));

        restore(name, previous.as_deref());
        assert!(env::var_os(name).is_none());
    }

    #[test]
    fn restore_reinstates_prior_value() {
        let name = OsStr::new("SCOPED_RESTORE_UNIT_SET");
        let seeded = apply(name, Some(OsStr::new("initial")));

        let previous = apply(name, None);
        assert!(env::var_os(name).is_none());
        assert_eq!(previous.as_deref(), Some(OsStr::new("initial")));

        restore(name, previous.as_deref());
        assert_eq!(env::var(name).as_deref(), Ok("initial"));
        restore(name, seeded.as_deref());
    }
}
