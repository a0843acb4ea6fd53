//! CLI error type.

use meetfetch::config::ConfigError;
use meetfetch::logging::LoggingError;
use meetfetch::source::HttpError;
use meetfetch::FetchError;
use thiserror::Error;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to write output: {0}")]
    Output(String),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Cancellation exits with 130, the conventional code for Ctrl+C.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Fetch(e) if e.is_cancelled() => 130,
            CliError::Config(_) | CliError::ConfigFile(_) => 2,
            _ => 1,
        }
    }
}
