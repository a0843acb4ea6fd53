//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; binaries call [`init_logging`]
//! once at startup. `RUST_LOG` always takes precedence over the configured
//! default filter.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file path has no file name component.
    #[error("invalid log file path: {0}")]
    InvalidPath(PathBuf),

    /// A global subscriber was already installed.
    #[error("failed to initialize logging: {0}")]
    Init(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Write to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new(false)
    }
}

impl LogSettings {
    /// Settings for normal or verbose output on stderr.
    pub fn new(verbose: bool) -> Self {
        let default_filter = if verbose {
            "meetfetch=debug,meetfetch_cli=debug,info"
        } else {
            "meetfetch=info,meetfetch_cli=info,warn"
        };
        Self {
            default_filter: default_filter.to_string(),
            log_file: None,
        }
    }

    /// Send output to `path`.
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global tracing subscriber.
///
/// When logging to a file, the returned guard must be kept alive until exit
/// so buffered lines are flushed.
pub fn init_logging(settings: &LogSettings) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = settings.filter();

    match &settings.log_file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))?;

            Ok(None)
        }
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter() {
        assert!(LogSettings::new(true).default_filter.contains("meetfetch=debug"));
        assert!(LogSettings::new(false).default_filter.contains("meetfetch=info"));
        assert_eq!(LogSettings::default(), LogSettings::new(false));
    }

    #[test]
    fn test_with_log_file() {
        let settings = LogSettings::new(false).with_log_file("/tmp/meetfetch.log");
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/meetfetch.log")));
    }

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/meetfetch.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log"));
        assert_eq!(name, PathBuf::from("meetfetch.log"));

        let (dir, name) = split_log_path(Path::new("meetfetch.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("meetfetch.log"));

        assert!(split_log_path(Path::new("/")).is_err());
    }
}
