//! Validates environment patches restore the exact prior process state,
//! preserving the set/unset distinction.

use std::env;
use std::sync::Arc;

use scoped_restore::Scope;
use scoped_restore::test_support::RecordingHost;
use serial_test::serial;

fn explicit_scope() -> Scope {
    Scope::new(Arc::new(RecordingHost::new()))
}

fn force_set(name: &str, value: &str) {
    // SAFETY: #[serial] tests own the process environment while running.
    unsafe { env::set_var(name, value) };
}

fn force_unset(name: &str) {
    // SAFETY: #[serial] tests own the process environment while running.
    unsafe { env::remove_var(name) };
}

#[test]
#[serial]
fn set_env_restores_the_prior_value() {
    const NAME: &str = "SCOPED_RESTORE_SET_PRIOR";
    force_set(NAME, "initial");
    let scope = explicit_scope();

    scope.run(|c| {
        c.set_env(NAME, "new value");
        assert_eq!(env::var(NAME).as_deref(), Ok("new value"));
    });

    assert_eq!(env::var(NAME).as_deref(), Ok("initial"));
    scope.done();
    force_unset(NAME);
}

#[test]
#[serial]
fn set_env_on_an_unset_variable_leaves_it_unset() {
    const NAME: &str = "SCOPED_RESTORE_SET_UNSET";
    force_unset(NAME);
    let scope = explicit_scope();

    scope.run(|c| {
        c.set_env(NAME, "new value");
        assert_eq!(env::var(NAME).as_deref(), Ok("new value"));
    });

    assert!(env::var_os(NAME).is_none(), "variable must be unset, not empty");
    scope.done();
}

#[test]
#[serial]
fn unset_env_restores_the_prior_value() {
    const NAME: &str = "SCOPED_RESTORE_UNSET_PRIOR";
    force_set(NAME, "initial");
    let scope = explicit_scope();

    scope.run(|c| {
        c.unset_env(NAME);
        assert!(env::var_os(NAME).is_none());
    });

    assert_eq!(env::var(NAME).as_deref(), Ok("initial"));
    scope.done();
    force_unset(NAME);
}

#[test]
#[serial]
fn unset_env_on_an_unset_variable_stays_unset() {
    const NAME: &str = "SCOPED_RESTORE_UNSET_UNSET";
    force_unset(NAME);
    let scope = explicit_scope();

    scope.run(|c| {
        c.unset_env(NAME);
        assert!(env::var_os(NAME).is_none());
    });

    assert!(env::var_os(NAME).is_none());
    scope.done();
}

#[test]
#[serial]
fn layered_env_patches_unwind_to_the_original_state() {
    const NAME: &str = "SCOPED_RESTORE_LAYERED";
    force_set(NAME, "original");
    let scope = explicit_scope();

    scope.run(|c| {
        c.set_env(NAME, "first");
        c.unset_env(NAME);
        c.set_env(NAME, "second");
        assert_eq!(env::var(NAME).as_deref(), Ok("second"));
    });

    assert_eq!(env::var(NAME).as_deref(), Ok("original"));
    scope.done();
    force_unset(NAME);
}
