//! meetfetch - Adaptive, bandwidth-aware loading of paginated meeting listings
//!
//! This library estimates network throughput, turns the estimate into a batch
//! size and request parallelism, and drives concurrent paginated fetches that
//! preserve ordering, skip failed pages and honor cooperative cancellation.
//!
//! # Modules
//!
//! - [`estimator`] - Throughput estimation (hints, calibration, smoothing)
//! - [`plan`] - Speed tiers and loading plans
//! - [`fetch`] - The batch fetch driver and page fetcher contract
//! - [`source`] - HTTP page fetcher, calibration probe and listing record
//! - [`config`] - Tuning configuration and INI loading
//! - [`logging`] - Tracing subscriber setup

use std::future::Future;
use std::pin::Pin;

pub mod config;
pub mod estimator;
pub mod fetch;
pub mod logging;
pub mod plan;
pub mod source;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use config::FetchConfig;
pub use estimator::ThroughputEstimator;
pub use fetch::{BatchFetchDriver, FetchError, PageError, PageFetcher};
pub use plan::{LoadingPlan, PlanCalculator, SpeedTier};
