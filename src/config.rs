//! Captures cleanup behaviour supplied via environment variables.

use camino::Utf8PathBuf;
use color_eyre::eyre::eyre;
use figment::{Figment, providers::Env};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Prefix shared by the crate's configuration variables.
pub(crate) const ENV_PREFIX: &str = "SCOPED_";

/// Configuration for temporary-directory handling.
///
/// Loaded from `SCOPED_`-prefixed environment variables: `SCOPED_TEMP_ROOT`
/// selects the parent directory for created temporary directories, and
/// `SCOPED_RETAIN_TEMP_DIRS=true` keeps them in place at unwind time for
/// post-mortem inspection.
///
/// # Examples
/// ```
/// use scoped_restore::CleanupCfg;
///
/// let cfg = CleanupCfg::default();
/// assert!(cfg.temp_root.is_none());
/// assert!(!cfg.retain_temp_dirs);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupCfg {
    /// Parent directory for temporary directories when provided.
    pub temp_root: Option<Utf8PathBuf>,
    /// Retains created temporary directories instead of removing them.
    pub retain_temp_dirs: bool,
}

impl CleanupCfg {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    /// Returns an error when a variable is present but cannot be parsed
    /// into the expected field type.
    pub fn load() -> ConfigResult<Self> {
        Figment::new()
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|err| ConfigError::from(eyre!(err)))
    }
}
