//! Core types for throughput estimation.

use std::fmt;
use std::time::{Duration, Instant};

/// Where a throughput figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    /// Declared by the host platform.
    PlatformHint,
    /// Timed transfer against the calibration endpoint.
    Calibration,
    /// Smoothed from completed page requests.
    Observed,
    /// Conservative default after measurement failed.
    Fallback,
    /// Set explicitly by the caller.
    Manual,
}

impl SampleSource {
    /// Get a human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleSource::PlatformHint => "platform-hint",
            SampleSource::Calibration => "calibration",
            SampleSource::Observed => "observed",
            SampleSource::Fallback => "fallback",
            SampleSource::Manual => "manual",
        }
    }
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bandwidth estimate and when it was produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    /// Estimated throughput in megabits per second. Never negative.
    pub mbps: f64,
    /// When the estimate was computed or last updated.
    pub measured_at: Instant,
    /// How the estimate was obtained.
    pub source: SampleSource,
}

impl ThroughputSample {
    /// Create a sample stamped with the current time.
    pub fn now(mbps: f64, source: SampleSource) -> Self {
        Self {
            mbps: if mbps.is_finite() { mbps.max(0.0) } else { 0.0 },
            measured_at: Instant::now(),
            source,
        }
    }

    /// Time since the sample was taken.
    pub fn age(&self) -> Duration {
        self.measured_at.elapsed()
    }

    /// Whether the sample is younger than `window`.
    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() < window
    }
}

/// Result of a timed calibration transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTransfer {
    /// Payload size received.
    pub bytes: u64,
    /// Wall-clock time from request start to last byte.
    pub elapsed: Duration,
}

impl CalibrationTransfer {
    /// Uncorrected throughput in Mbps, or `None` for an empty or instant transfer.
    pub fn raw_mbps(&self) -> Option<f64> {
        bytes_to_mbps(self.bytes, self.elapsed)
    }
}

/// Convert a transfer of `bytes` over `elapsed` into megabits per second.
pub(crate) fn bytes_to_mbps(bytes: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if bytes == 0 || secs <= 0.0 {
        return None;
    }
    Some((bytes as f64 * 8.0) / secs / 1_000_000.0)
}
