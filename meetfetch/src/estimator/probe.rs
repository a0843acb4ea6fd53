//! Bandwidth probe abstraction.
//!
//! The estimator asks a probe for a declared bandwidth first and falls back
//! to timing a calibration transfer. Hiding both behind a trait keeps the
//! estimator free of HTTP details and lets tests script the network.

use thiserror::Error;

use super::types::CalibrationTransfer;
use crate::BoxFuture;

/// Errors from a calibration attempt.
///
/// These never reach callers of [`ThroughputEstimator::measure`]; the
/// estimator substitutes its fallback estimate instead.
///
/// [`ThroughputEstimator::measure`]: super::ThroughputEstimator::measure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProbeError {
    /// The transfer did not finish in time.
    #[error("calibration timed out after {0} ms")]
    Timeout(u64),

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The transfer carried no bytes or took no measurable time.
    #[error("calibration transfer unusable: {0}")]
    InvalidTransfer(String),

    /// No calibration endpoint is available.
    #[error("no calibration endpoint configured")]
    Unavailable,
}

/// Source of raw bandwidth information.
pub trait BandwidthProbe: Send + Sync {
    /// Bandwidth declared by the host platform (Mbps), if it exposes one.
    fn platform_hint(&self) -> Option<f64> {
        None
    }

    /// Time a small transfer against the calibration endpoint.
    fn calibrate(&self) -> BoxFuture<'_, Result<CalibrationTransfer, ProbeError>>;
}
