//! HTTP collaborators for loading meeting listings.
//!
//! - [`AsyncHttpClient`] abstracts GET requests so tests can script responses
//! - [`HttpPageFetcher`] loads `offset`/`limit` paginated JSON listings
//! - [`HttpBandwidthProbe`] times a small calibration download
//! - [`Meeting`] is the listing record
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use meetfetch::source::{AsyncReqwestClient, HttpBandwidthProbe, HttpPageFetcher, Meeting};
//!
//! let client = Arc::new(AsyncReqwestClient::with_timeout(config.http.request_timeout)?);
//! let probe = HttpBandwidthProbe::new(client.clone(), "https://api.example.org/ping");
//! let pages: HttpPageFetcher<Meeting> = HttpPageFetcher::new(client, "https://api.example.org/meetings");
//! ```

mod http;
mod meeting;
mod pages;
mod probe;

pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpError, HttpResponse};
pub use meeting::Meeting;
pub use pages::HttpPageFetcher;
pub use probe::HttpBandwidthProbe;

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
