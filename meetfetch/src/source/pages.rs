//! Offset/limit paginated JSON listings over HTTP.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::http::{AsyncHttpClient, HttpError};
use crate::fetch::{Page, PageError, PageFetcher};
use crate::BoxFuture;

/// Accepted response shapes: a bare array, or an object wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    List(Vec<T>),
    Wrapped {
        #[serde(alias = "data", alias = "meetings", alias = "results")]
        items: Vec<T>,
    },
}

impl<T> PageBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            PageBody::List(items) => items,
            PageBody::Wrapped { items } => items,
        }
    }
}

/// Fetches pages as `GET {base_url}?offset={offset}&limit={count}`.
///
/// The token is checked before a request is issued; a request already on
/// the wire runs to completion. Every page reports its body size, so the
/// driver can feed real traffic back into the throughput estimate.
pub struct HttpPageFetcher<T> {
    client: Arc<dyn AsyncHttpClient>,
    base_url: String,
    offset_param: String,
    limit_param: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageFetcher<T> {
    /// Create a fetcher using `offset` and `limit` query parameters.
    pub fn new(client: Arc<dyn AsyncHttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            offset_param: "offset".to_string(),
            limit_param: "limit".to_string(),
            _item: PhantomData,
        }
    }

    /// Use different query parameter names (e.g. `skip` / `take`).
    pub fn with_params(mut self, offset_param: &str, limit_param: &str) -> Self {
        self.offset_param = offset_param.to_string();
        self.limit_param = limit_param.to_string();
        self
    }

    /// URL for one page.
    pub fn page_url(&self, offset: usize, count: usize) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}&{}={}",
            self.base_url, separator, self.offset_param, offset, self.limit_param, count
        )
    }
}

impl<T> PageFetcher for HttpPageFetcher<T>
where
    T: DeserializeOwned + Send,
{
    type Item = T;

    fn fetch_page(
        &self,
        offset: usize,
        count: usize,
        cancellation: CancellationToken,
    ) -> BoxFuture<'_, Result<Page<T>, PageError>> {
        Box::pin(async move {
            if cancellation.is_cancelled() {
                return Err(PageError::Cancelled);
            }

            let url = self.page_url(offset, count);
            let response = self.client.get(&url).await.map_err(|e| match e {
                HttpError::Timeout => PageError::Timeout,
                other => PageError::Http(other.to_string()),
            })?;

            if !response.is_success() {
                return Err(PageError::Status {
                    status: response.status,
                    url,
                });
            }

            let bytes = response.body.len() as u64;
            let body: PageBody<T> = serde_json::from_slice(&response.body)
                .map_err(|e| PageError::Decode(e.to_string()))?;

            Ok(Page::with_bytes(body.into_items(), bytes))
        })
    }
}
