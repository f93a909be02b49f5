pub mod app_config;

use dotenv::dotenv;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub use app_config::{
    AppConfiguration, CleanupSettings, ConfigManager, LoggingConfig, OutputFormat,
    PropagationPolicy,
};

/// Load a `.env` file from the working directory or its parents, if one exists.
///
/// Returns the file that was loaded. Runs before logging is set up, so the
/// caller reports the outcome.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv().ok()
}

/// Load an explicitly requested env file; a missing file is an error
pub fn load_dotenv_from(path: &Path) -> Result<PathBuf> {
    dotenv::from_path(path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to load env file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(path.to_path_buf())
}
