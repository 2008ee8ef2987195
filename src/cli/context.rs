use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::app_config::AppConfig;
use crate::core::errors::{ClairError, Result};

static CLAIR_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Set the clair directory for this run. Defaults to `.clair`.
pub fn init(custom: Option<&str>) {
    let dir = custom
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".clair"));
    let _ = CLAIR_DIR.set(dir);
}

pub fn clair_dir() -> &'static Path {
    CLAIR_DIR
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(".clair"))
}

/// Load the configuration, failing with a hint when `clair init` has not run.
pub fn load_config() -> Result<AppConfig> {
    let dir = clair_dir();
    if !dir.exists() {
        return Err(ClairError::InvalidConfig {
            detail: format!(
                "No clair directory at {}. Run 'clair init' first.",
                dir.display()
            ),
        });
    }
    AppConfig::load(dir)
}
