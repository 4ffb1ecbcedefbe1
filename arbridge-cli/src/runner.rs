//! Shared setup for commands that run the pose-sync loop.

use std::path::{Path, PathBuf};

use arbridge::config::{config_file_path, ConfigFile};
use arbridge::logging::{init_logging, WorkerGuard};
use tracing::info;

use crate::error::CliError;

/// Loads configuration and installs logging for the lifetime of a command.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    // Flushes the log file on drop.
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Load the config at `path` (or the default location) and start logging.
    pub fn new(path: Option<&Path>) -> Result<Self, CliError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;
        let log_guard = init_logging(&config.logging)?;
        Ok(Self {
            config,
            config_path,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = arbridge::VERSION,
            command,
            config = %self.config_path.display(),
            "arbridge starting"
        );
    }
}
