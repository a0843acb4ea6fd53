//! Error types for paginated fetching.

use thiserror::Error;

/// Result type for driver operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of a single page request.
///
/// Everything except [`PageError::Cancelled`] is isolated by the driver: the
/// page counts as empty and loading continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PageError {
    /// The request observed the session's cancellation signal.
    #[error("page request cancelled")]
    Cancelled,

    /// The request did not complete in time.
    #[error("page request timed out")]
    Timeout,

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body could not be decoded.
    #[error("failed to decode page: {0}")]
    Decode(String),

    /// Any other caller-defined failure.
    #[error("{0}")]
    Other(String),
}

impl PageError {
    /// Whether this failure is a cancellation rather than a genuine error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PageError::Cancelled)
    }
}

/// Session-level failure of a loading run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The run was cancelled. Items gathered so far are discarded;
    /// `items_loaded` reports how many had been accumulated.
    #[error("fetch cancelled after {items_loaded} items")]
    Cancelled { items_loaded: usize },
}

impl FetchError {
    /// Whether the run ended because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled { .. })
    }
}
