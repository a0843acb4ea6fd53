//! Round-based batch fetch driver.
//!
//! Each run moves through these states:
//!
//! ```text
//! idle ──► planning ──► fetching-round ──► aggregating ─┬─► fetching-round ...
//!                                                       ├─► done       (cursor reached total)
//!                                                       ├─► exhausted  (a page came back short)
//!                                                       └─► cancelled  (token set at a boundary)
//! ```
//!
//! A round issues up to `parallelism` requests concurrently and waits for
//! all of them to settle before the next round starts, so no more than
//! `parallelism` requests are ever outstanding.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use super::error::{FetchError, FetchResult};
use super::fetcher::PageFetcher;
use super::progress::ProgressCallback;
use super::state::SessionState;
use super::types::{round_requests, BatchRequest, BatchResult, FetchSummary};
use crate::config::FetchConfig;
use crate::estimator::ThroughputEstimator;
use crate::plan::{LoadingPlan, PlanCalculator};

/// Drives an adaptive, paginated load.
///
/// The plan is fixed for the duration of a run, even if the estimator is
/// updated by other traffic meanwhile. After each round, the wire size of
/// its sized pages over the round's wall time is fed back into the
/// estimator, so the next run starts from a better estimate. Pages in a
/// round share the link, so they are measured together rather than one
/// by one.
#[derive(Debug, Clone)]
pub struct BatchFetchDriver {
    estimator: Arc<ThroughputEstimator>,
    calculator: PlanCalculator,
}

impl BatchFetchDriver {
    /// Create a driver from an estimator and plan calculator.
    pub fn new(estimator: Arc<ThroughputEstimator>, calculator: PlanCalculator) -> Self {
        Self {
            estimator,
            calculator,
        }
    }

    /// Create a driver whose plan tables come from `config`.
    pub fn from_config(config: &FetchConfig, estimator: Arc<ThroughputEstimator>) -> Self {
        Self::new(estimator, PlanCalculator::new(config))
    }

    /// Get the shared estimator.
    pub fn estimator(&self) -> &Arc<ThroughputEstimator> {
        &self.estimator
    }

    /// Get the plan calculator.
    pub fn calculator(&self) -> &PlanCalculator {
        &self.calculator
    }

    /// Plan a run over `total_items` from the current throughput estimate.
    pub async fn plan(&self, total_items: usize, loaded: usize) -> LoadingPlan {
        let sample = self.estimator.measure().await;
        self.calculator.plan_for_throughput(sample.mbps, total_items, loaded)
    }

    /// Load `[start_offset, total_items)` and return the items in order.
    ///
    /// Failed pages are skipped. Returns [`FetchError::Cancelled`] if the
    /// token is set at a round boundary or a page reports cancellation.
    pub async fn run<F>(
        &self,
        fetcher: &F,
        total_items: usize,
        start_offset: usize,
        on_progress: Option<&ProgressCallback>,
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<F::Item>>
    where
        F: PageFetcher + ?Sized,
    {
        self.run_detailed(fetcher, total_items, start_offset, on_progress, cancellation)
            .await
            .map(|summary| summary.items)
    }

    /// Like [`run`](Self::run), but returns the full [`FetchSummary`].
    pub async fn run_detailed<F>(
        &self,
        fetcher: &F,
        total_items: usize,
        start_offset: usize,
        on_progress: Option<&ProgressCallback>,
        cancellation: &CancellationToken,
    ) -> FetchResult<FetchSummary<F::Item>>
    where
        F: PageFetcher + ?Sized,
    {
        let plan = self.plan(total_items, start_offset).await;
        self.run_with_plan_detailed(
            fetcher,
            plan,
            total_items,
            start_offset,
            on_progress,
            cancellation,
        )
        .await
    }

    /// Load with a precomputed plan instead of consulting the estimator.
    pub async fn run_with_plan<F>(
        &self,
        fetcher: &F,
        plan: LoadingPlan,
        total_items: usize,
        start_offset: usize,
        on_progress: Option<&ProgressCallback>,
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<F::Item>>
    where
        F: PageFetcher + ?Sized,
    {
        self.run_with_plan_detailed(
            fetcher,
            plan,
            total_items,
            start_offset,
            on_progress,
            cancellation,
        )
        .await
        .map(|summary| summary.items)
    }

    /// Load with a precomputed plan and return the full [`FetchSummary`].
    pub async fn run_with_plan_detailed<F>(
        &self,
        fetcher: &F,
        plan: LoadingPlan,
        total_items: usize,
        start_offset: usize,
        on_progress: Option<&ProgressCallback>,
        cancellation: &CancellationToken,
    ) -> FetchResult<FetchSummary<F::Item>>
    where
        F: PageFetcher + ?Sized,
    {
        let batch_size = plan.batch_size.max(1);
        let parallelism = plan.parallelism.max(1);
        let mut state = SessionState::new(start_offset, total_items);
        let mut exhausted = false;

        tracing::info!(
            tier = %plan.tier,
            batch_size,
            parallelism,
            remaining = plan.remaining_items,
            estimated_rounds = plan.round_count,
            "Starting batched fetch"
        );

        report(on_progress, state.loaded(), total_items, batch_size, &plan);

        while !state.is_complete() {
            if cancellation.is_cancelled() {
                return Err(self.cancelled(&state));
            }

            let requests = round_requests(state.cursor, total_items, batch_size, parallelism);
            let span: usize = requests.iter().map(|r| r.count).sum();
            let round_started = Instant::now();
            let results = self.fetch_round(fetcher, &requests, cancellation).await;
            let round_elapsed = round_started.elapsed();

            if results
                .iter()
                .any(|r| matches!(&r.outcome, Err(e) if e.is_cancelled()))
            {
                return Err(self.cancelled(&state));
            }

            let mut yielded = 0;
            let mut round_bytes: Option<u64> = None;
            for result in results {
                let request = result.request;
                match result.outcome {
                    Ok(mut page) => {
                        if let Some(bytes) = page.bytes {
                            round_bytes = Some(round_bytes.unwrap_or(0) + bytes);
                        }
                        if page.items.len() > request.count {
                            tracing::debug!(
                                offset = request.offset,
                                requested = request.count,
                                received = page.items.len(),
                                "Page returned more items than requested, truncating"
                            );
                            page.items.truncate(request.count);
                        }
                        if page.items.len() < request.count {
                            exhausted = true;
                        }
                        yielded += page.items.len();
                        state.record_page(page.items);
                    }
                    Err(e) => {
                        tracing::warn!(
                            offset = request.offset,
                            count = request.count,
                            elapsed_ms = result.elapsed.as_millis() as u64,
                            error = %e,
                            "Page request failed, skipping batch"
                        );
                        state.record_failure(request);
                    }
                }
            }

            if let Some(bytes) = round_bytes {
                self.estimator.record_observed_transfer(bytes, round_elapsed);
            }

            state.advance(span);

            tracing::debug!(
                round = state.rounds,
                requests = requests.len(),
                yielded,
                cursor = state.cursor,
                "Round settled"
            );

            report(on_progress, state.loaded(), total_items, batch_size, &plan);

            if exhausted {
                tracing::debug!(
                    cursor = state.cursor,
                    total_items,
                    "Upstream returned a short page, stopping"
                );
                break;
            }
        }

        tracing::info!(
            items = state.items.len(),
            rounds = state.rounds,
            failed_batches = state.failed.len(),
            exhausted,
            "Batched fetch complete"
        );

        Ok(state.finish(plan, exhausted))
    }

    /// Issue one round concurrently and return its results in offset order.
    async fn fetch_round<F>(
        &self,
        fetcher: &F,
        requests: &[BatchRequest],
        cancellation: &CancellationToken,
    ) -> Vec<BatchResult<F::Item>>
    where
        F: PageFetcher + ?Sized,
    {
        let mut pending: FuturesUnordered<_> = requests
            .iter()
            .map(|&request| {
                let token = cancellation.clone();
                async move {
                    let started = Instant::now();
                    let outcome = fetcher
                        .fetch_page(request.offset, request.count, token)
                        .await;
                    BatchResult {
                        request,
                        outcome,
                        elapsed: started.elapsed(),
                    }
                }
            })
            .collect();

        let mut results = Vec::with_capacity(requests.len());
        while let Some(result) = pending.next().await {
            results.push(result);
        }

        results.sort_by_key(|r| r.request.offset);
        results
    }

    fn cancelled<T>(&self, state: &SessionState<T>) -> FetchError {
        tracing::info!(
            items_loaded = state.items.len(),
            rounds = state.rounds,
            "Batched fetch cancelled"
        );
        FetchError::Cancelled {
            items_loaded: state.items.len(),
        }
    }
}

fn report(
    on_progress: Option<&ProgressCallback>,
    loaded: usize,
    total: usize,
    batch_size: usize,
    plan: &LoadingPlan,
) {
    if let Some(cb) = on_progress {
        cb(loaded, total, batch_size, plan.tier);
    }
}
