//! Request, page and summary types for batch fetching.

use std::time::Duration;

use super::error::PageError;
use crate::plan::LoadingPlan;

/// A single page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchRequest {
    /// Index of the first item requested.
    pub offset: usize,
    /// Number of items requested (always > 0).
    pub count: usize,
}

impl BatchRequest {
    /// One past the last offset covered.
    pub fn end(&self) -> usize {
        self.offset + self.count
    }
}

/// Items returned by one page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Wire size of the response, when the fetcher knows it.
    ///
    /// Pages that report a size feed the throughput estimator.
    pub bytes: Option<u64>,
}

impl<T> Page<T> {
    /// A page with no size information.
    pub fn new(items: Vec<T>) -> Self {
        Self { items, bytes: None }
    }

    /// A page whose response size is known.
    pub fn with_bytes(items: Vec<T>, bytes: u64) -> Self {
        Self {
            items,
            bytes: Some(bytes),
        }
    }
}

impl<T> From<Vec<T>> for Page<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// A settled request paired with its outcome.
///
/// Keeps the originating offset so results can be put back in order after
/// completing in arbitrary order.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub request: BatchRequest,
    pub outcome: Result<Page<T>, PageError>,
    /// Time from issue to settlement.
    pub elapsed: Duration,
}

/// Detailed result of a loading run.
#[derive(Debug, Clone)]
pub struct FetchSummary<T> {
    /// Loaded items in offset order.
    pub items: Vec<T>,
    /// Plan the run used.
    pub plan: LoadingPlan,
    /// Rounds issued.
    pub rounds: usize,
    /// Requests that failed and were skipped.
    pub failed_batches: Vec<BatchRequest>,
    /// Whether the run stopped early because the source ran dry.
    pub exhausted: bool,
    /// Offset cursor when the run ended.
    pub next_offset: usize,
}

impl<T> FetchSummary<T> {
    /// Whether every issued request succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

/// Build the requests for one round.
///
/// Produces up to `parallelism` contiguous, non-overlapping requests of
/// `batch_size` starting at `cursor`, truncating the last to stop at `end`.
pub fn round_requests(
    cursor: usize,
    end: usize,
    batch_size: usize,
    parallelism: usize,
) -> Vec<BatchRequest> {
    let batch_size = batch_size.max(1);
    let mut requests = Vec::with_capacity(parallelism);
    let mut offset = cursor;

    while requests.len() < parallelism && offset < end {
        let count = batch_size.min(end - offset);
        requests.push(BatchRequest { offset, count });
        offset += count;
    }

    requests
}
