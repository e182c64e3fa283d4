//! Domain error types for the scoped restoration engine.
//!
//! Contract violations (deferring onto a completed scope, mismatched patch
//! types, finishing a scope twice) are programmer errors and panic at the
//! call site rather than appearing here; these types cover the expected
//! runtime failures: temporary-directory creation and configuration parsing.

use color_eyre::Report;
use thiserror::Error;

/// Result alias for operations that may return a [`ScopedRestoreError`].
pub type Result<T> = std::result::Result<T, ScopedRestoreError>;

/// Result alias for temporary-directory fallible operations.
pub type TempDirResult<T> = std::result::Result<T, TempDirError>;

/// Result alias for configuration fallible operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level error exposed by the crate.
#[derive(Debug, Error)]
pub enum ScopedRestoreError {
    /// Indicates temporary-directory management failed.
    #[error("temporary directory management failed")]
    TempDir(#[from] TempDirError),
    /// Indicates configuration parsing failed.
    #[error("configuration parsing failed")]
    Config(#[from] ConfigError),
}

/// Captures temporary-directory failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TempDirError(#[from] Report);

/// Captures configuration failures.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ConfigError(#[from] Report);
