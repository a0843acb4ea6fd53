//! Async HTTP client abstraction for testability

use std::time::Duration;

use thiserror::Error;

use crate::BoxFuture;

/// Transport-level HTTP failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HttpError {
    /// The request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or protocol failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for async HTTP GET requests.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and reads the whole body.
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, HttpError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with a 30 second timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, HttpError>> {
        let request = self.client.get(url);
        Box::pin(async move {
            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(map_reqwest_error)?;

            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Transport(e.to_string())
    }
}
