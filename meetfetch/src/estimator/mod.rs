//! Network throughput estimation.
//!
//! Produces the bandwidth estimate (Mbps) that sizes each loading session.
//!
//! # Module Structure
//!
//! - [`types`] - `ThroughputSample`, `SampleSource`, `CalibrationTransfer`
//! - [`probe`] - `BandwidthProbe` trait for platform hints and calibration
//! - [`throughput`] - `ThroughputEstimator`, the owned estimate cache
//!
//! # Estimation Flow
//!
//! ```text
//! measure() ──► cached sample fresh? ──yes──► return it
//!                      │ no
//!                      ▼
//!              platform hint? ──yes──► cache + return
//!                      │ no
//!                      ▼
//!              timed calibration ──ok──► × correction, clamp to ceiling ──► cache + return
//!                      │ failed
//!                      ▼
//!              conservative fallback ──► cache + return
//!
//! record_observed_transfer() ──► new = old × 0.7 + sample × 0.3 ──► cache
//! ```

mod probe;
mod throughput;
mod types;

pub use probe::{BandwidthProbe, ProbeError};
pub use throughput::ThroughputEstimator;
pub use types::{CalibrationTransfer, SampleSource, ThroughputSample};
