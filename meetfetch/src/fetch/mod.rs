//! Adaptive paginated fetching.
//!
//! This module drives the load of a paginated collection:
//! - Page fetcher abstraction and closure adapter (`fetcher`)
//! - Request, page and summary types (`types`)
//! - Per-session cursor and accumulation state (`state`)
//! - Progress callback contract (`progress`)
//! - The round-based orchestration loop (`driver`)
//!
//! # Architecture
//!
//! ```text
//! BatchFetchDriver
//!         │
//!         ├── ThroughputEstimator ──► PlanCalculator ──► LoadingPlan (once per run)
//!         │
//!         ├── round: up to `parallelism` BatchRequests ──► PageFetcher (concurrent)
//!         │           │
//!         │           └── settle all ──► sort by offset ──► SessionState
//!         │
//!         ├── ProgressCallback (before the first round and after each round)
//!         │
//!         └── CancellationToken (checked at every round boundary)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use meetfetch::fetch::{page_fn, BatchFetchDriver, Page};
//!
//! let driver = BatchFetchDriver::from_config(&config, estimator);
//! let fetcher = page_fn(|offset, count, _cancel| async move {
//!     Ok(Page::new(load_rows(offset, count).await))
//! });
//!
//! let meetings = driver
//!     .run(&fetcher, total, 0, Some(&on_progress), &CancellationToken::new())
//!     .await?;
//! ```

mod driver;
mod error;
mod fetcher;
mod progress;
mod state;
mod types;

pub use driver::BatchFetchDriver;
pub use error::{FetchError, FetchResult, PageError};
pub use fetcher::{page_fn, FnPageFetcher, PageFetcher};
pub use progress::ProgressCallback;
pub use types::{round_requests, BatchRequest, BatchResult, FetchSummary, Page};
