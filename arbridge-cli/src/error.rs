//! CLI error type.

use std::fmt;

use arbridge::config::{ConfigError, UnknownConfigKey};
use arbridge::logging::LoggingError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or conflicting settings.
    Config(String),
    /// Loading or saving the configuration file failed.
    ConfigFile(ConfigError),
    /// Installing the tracing subscriber failed.
    Logging(LoggingError),
    /// Building the async runtime or installing the signal handler failed.
    Runtime(String),
    /// Writing command output failed.
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Logging setup failed: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<UnknownConfigKey> for CliError {
    fn from(e: UnknownConfigKey) -> Self {
        CliError::Config(format!(
            "{}. Use 'arbridge config list' to see available keys.",
            e
        ))
    }
}
