//! Temporary-directory creation with guarded best-effort removal.
//!
//! Creation failures surface synchronously to the caller; removal runs as a
//! deferred restore action and never aborts the rest of an unwind. Removal
//! refuses paths that are empty, a bare root, or contain parent-directory
//! components, so a corrupted path can never delete outside the intended
//! tree.

use std::io::ErrorKind;
use std::path::{Component, Path};

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Context, eyre};
use tempfile::Builder;

use crate::config::CleanupCfg;
use crate::error::{TempDirError, TempDirResult};
use crate::host::TestHost;
use crate::observability::LOG_TARGET;

const TEMP_DIR_PREFIX: &str = "scoped-restore-";

/// Creates a fresh, uniquely named directory and hands ownership of its
/// removal to the caller (`tempfile`'s own drop-time deletion is disarmed).
pub(crate) fn create_temp_dir(cfg: &CleanupCfg) -> TempDirResult<Utf8PathBuf> {
    let mut builder = Builder::new();
    builder.prefix(TEMP_DIR_PREFIX);
    let dir = match &cfg.temp_root {
        Some(root) => {
            std::fs::create_dir_all(root.as_std_path())
                .with_context(|| format!("create temp root {root}"))?;
            builder.tempdir_in(root.as_std_path())
        }
        None => builder.tempdir(),
    }
    .context("create temporary directory")?;
    let path = dir.keep();
    Utf8PathBuf::from_path_buf(path).map_err(|raw| {
        TempDirError::from(eyre!(
            "temporary directory path {} is not valid UTF-8",
            raw.display()
        ))
    })
}

/// Deferred removal of a directory created by [`create_temp_dir`].
///
/// Failures are logged and reported through the host's failure sink; they
/// do not propagate, so the remainder of the scope's unwind still runs.
pub(crate) fn remove_temp_dir(path: &Utf8Path, retain: bool, host: &dyn TestHost) {
    if retain {
        tracing::info!(
            target: LOG_TARGET,
            path = %path,
            "retaining temporary directory"
        );
        return;
    }
    match try_remove_dir_all(path.as_std_path()) {
        Ok(RemovalOutcome::Removed) => tracing::debug!(
            target: LOG_TARGET,
            path = %path,
            "removed temporary directory"
        ),
        Ok(RemovalOutcome::Missing) => tracing::debug!(
            target: LOG_TARGET,
            path = %path,
            "temporary directory already removed"
        ),
        Err(err) => {
            tracing::warn!(
                target: LOG_TARGET,
                path = %path,
                error = %err,
                "failed to remove temporary directory"
            );
            host.report_failure(&format!(
                "failed to remove temporary directory {path}: {err}"
            ));
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum RemovalOutcome {
    Removed,
    Missing,
}

fn try_remove_dir_all(path: &Path) -> Result<RemovalOutcome, std::io::Error> {
    if is_unsafe_removal_path(path) {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("refuse to remove unsafe path {}", path.display()),
        ));
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(RemovalOutcome::Removed),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RemovalOutcome::Missing),
        Err(err) => Err(err),
    }
}

/// A path qualifies for removal only when it names something strictly below
/// a root: no upward traversal, and more than a bare root or `.` component.
fn is_unsafe_removal_path(path: &Path) -> bool {
    let mut components = path.components();
    let Some(first) = components.next() else {
        return true;
    };
    let bare = components.next().is_none()
        && matches!(
            first,
            Component::RootDir | Component::CurDir | Component::Prefix(_)
        );
    bare
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::{RemovalOutcome, is_unsafe_removal_path, remove_temp_dir, try_remove_dir_all};
    use crate::test_support::{RecordingHost, capture_logs, capture_warn_logs};

    use camino::Utf8Path;
    use std::path::Path;
    use tracing::Level;

    #[test]
    fn refuses_root_and_traversal_paths() {
        assert!(is_unsafe_removal_path(Path::new("")));
        assert!(is_unsafe_removal_path(Path::new("/")));
        assert!(is_unsafe_removal_path(Path::new(".")));
        assert!(is_unsafe_removal_path(Path::new("/tmp/../etc")));
        assert!(!is_unsafe_removal_path(Path::new("/tmp/scoped-restore-x")));
    }

    #[test]
    fn missing_directory_is_tolerated() {
        let outcome = try_remove_dir_all(Path::new("/tmp/scoped-restore-absent"))
            .expect("missing path should not error");
        assert!(matches!(outcome, RemovalOutcome::Missing));
    }

    #[test]
    fn unsafe_path_errors_without_touching_disk() {
        let err = try_remove_dir_all(Path::new("/")).expect_err("root must be refused");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn retention_logs_and_keeps_the_tree() {
        let host = RecordingHost::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8Path::from_path(dir.path()).expect("utf-8 temp path");

        let (logs, ()) = capture_logs(Level::INFO, || remove_temp_dir(path, true, &host));

        assert!(logs.iter().any(|line| line.contains("retaining temporary directory")));
        assert!(path.is_dir());
        assert!(host.failures().is_empty());
    }

    #[test]
    fn removal_failure_warns_and_reports_to_the_sink() {
        let host = RecordingHost::new();

        let (logs, ()) = capture_warn_logs(|| remove_temp_dir(Utf8Path::new("/"), false, &host));

        assert!(logs.iter().any(|line| line.contains("failed to remove temporary directory")));
        let failures = host.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("refuse to remove unsafe path"));
    }
}
