use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lantern_lint_host::DEFAULT_TOOLCHAIN;
use log::warn;

pub const TOOLCHAIN_VAR: &str = "LANTERN_TOOLCHAIN";
pub const LINT_DIR_VAR: &str = "LANTERN_LINT_DIR";
pub const CACHE_DIR_VAR: &str = "LANTERN_CACHE_DIR";
pub const CHECK_TIMEOUT_VAR: &str = "LANTERN_CHECK_TIMEOUT_SECS";

const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 300;
const DEFAULT_LINT_DIR: &str = "lints";

/// Server configuration, read once at startup from the environment.
///
/// Blank values count as unset; a malformed timeout is logged and replaced
/// by the default rather than failing startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub toolchain: String,
    /// Absolute override for the plugin directory. The default is
    /// `<workspace>/lints`, which only resolves once the workspace root
    /// is known.
    pub lint_dir_override: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub check_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let toolchain =
            read(&lookup, TOOLCHAIN_VAR).unwrap_or_else(|| DEFAULT_TOOLCHAIN.to_string());
        let lint_dir_override = read(&lookup, LINT_DIR_VAR).map(PathBuf::from);
        let cache_dir = read(&lookup, CACHE_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);
        let check_timeout = match read(&lookup, CHECK_TIMEOUT_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!("ignoring {CHECK_TIMEOUT_VAR}={raw:?}: not a number of seconds");
                    Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS)
                }
            },
            None => Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
        };

        Self {
            toolchain,
            lint_dir_override,
            cache_dir,
            check_timeout,
        }
    }

    /// Plugin directory for a given workspace root.
    pub fn lint_dir(&self, workspace_root: &Path) -> PathBuf {
        match &self.lint_dir_override {
            Some(dir) => dir.clone(),
            None => workspace_root.join(DEFAULT_LINT_DIR),
        }
    }
}

fn read(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("lantern")
        .join("lint-artifacts")
}
