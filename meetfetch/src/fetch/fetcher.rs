//! Page fetcher abstraction.

use std::future::Future;
use std::marker::PhantomData;

use tokio_util::sync::CancellationToken;

use super::error::PageError;
use super::types::Page;
use crate::BoxFuture;

/// Caller-supplied source of pages.
///
/// Implementations should be idempotent for the same `(offset, count)` and
/// must report cancellation as [`PageError::Cancelled`] so the driver can
/// tell it apart from ordinary failures.
///
/// # Dyn Compatibility
///
/// Uses `Pin<Box<dyn Future>>` so fetchers can be held as
/// `Arc<dyn PageFetcher<Item = T>>`.
pub trait PageFetcher: Send + Sync {
    /// Record type produced by this source.
    type Item: Send;

    /// Fetch `count` items starting at `offset`.
    ///
    /// `cancellation` is the session's token. The fetcher may use it to stop
    /// early; the driver never tears a request down itself.
    fn fetch_page(
        &self,
        offset: usize,
        count: usize,
        cancellation: CancellationToken,
    ) -> BoxFuture<'_, Result<Page<Self::Item>, PageError>>;
}

/// Adapts an async closure into a [`PageFetcher`].
pub struct FnPageFetcher<F, T> {
    f: F,
    _item: PhantomData<fn() -> T>,
}

/// Wrap `f(offset, count, cancellation)` as a page fetcher.
pub fn page_fn<F, Fut, T>(f: F) -> FnPageFetcher<F, T>
where
    F: Fn(usize, usize, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page<T>, PageError>> + Send + 'static,
    T: Send,
{
    FnPageFetcher {
        f,
        _item: PhantomData,
    }
}

impl<F, Fut, T> PageFetcher for FnPageFetcher<F, T>
where
    F: Fn(usize, usize, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page<T>, PageError>> + Send + 'static,
    T: Send,
{
    type Item = T;

    fn fetch_page(
        &self,
        offset: usize,
        count: usize,
        cancellation: CancellationToken,
    ) -> BoxFuture<'_, Result<Page<T>, PageError>> {
        Box::pin((self.f)(offset, count, cancellation))
    }
}
