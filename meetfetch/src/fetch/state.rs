//! Session state for a single loading run.
//!
//! Owned exclusively by one driver invocation: the offset cursor, the
//! ordered output, and the bookkeeping needed for the final summary.

use super::types::{BatchRequest, FetchSummary};
use crate::plan::LoadingPlan;

/// Mutable state of one loading run.
#[derive(Debug, Clone)]
pub(crate) struct SessionState<T> {
    /// Offset the run started from.
    pub start_offset: usize,
    /// Next offset to request.
    pub cursor: usize,
    /// Total items the caller expects.
    pub total_items: usize,
    /// Items accumulated so far, in offset order.
    pub items: Vec<T>,
    /// Requests that failed and were treated as empty.
    pub failed: Vec<BatchRequest>,
    /// Rounds completed.
    pub rounds: usize,
}

impl<T> SessionState<T> {
    /// Create state for a run over `[start_offset, total_items)`.
    pub fn new(start_offset: usize, total_items: usize) -> Self {
        Self {
            start_offset,
            cursor: start_offset,
            total_items,
            items: Vec::new(),
            failed: Vec::new(),
            rounds: 0,
        }
    }

    /// Whether the cursor has reached the expected total.
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.total_items
    }

    /// Items loaded, counting those before the starting offset.
    pub fn loaded(&self) -> usize {
        self.start_offset + self.items.len()
    }

    /// Append a successful page's items.
    pub fn record_page(&mut self, items: Vec<T>) {
        self.items.extend(items);
    }

    /// Record a request that failed.
    pub fn record_failure(&mut self, request: BatchRequest) {
        self.failed.push(request);
    }

    /// Advance the cursor past a settled round.
    ///
    /// Moves by the span issued, not the items received, so an empty
    /// upstream page is never fetched twice.
    pub fn advance(&mut self, span: usize) {
        self.cursor += span;
        self.rounds += 1;
    }

    /// Consume the state into a run summary.
    pub fn finish(self, plan: LoadingPlan, exhausted: bool) -> FetchSummary<T> {
        FetchSummary {
            items: self.items,
            plan,
            rounds: self.rounds,
            failed_batches: self.failed,
            exhausted,
            next_offset: self.cursor,
        }
    }
}
