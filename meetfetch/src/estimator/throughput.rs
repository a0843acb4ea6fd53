//! Owned throughput estimate cache.
//!
//! Holds the single most recent [`ThroughputSample`] for one loader. Each
//! instance is independent, so tests and concurrent sessions can keep
//! separate estimates.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::probe::{BandwidthProbe, ProbeError};
use super::types::{bytes_to_mbps, SampleSource, ThroughputSample};
use crate::config::EstimatorConfig;

/// Throughput estimator with a freshness-windowed cache.
///
/// # Usage
///
/// ```ignore
/// let estimator = Arc::new(ThroughputEstimator::new(config, Arc::new(probe)));
///
/// // Before a loading session
/// let sample = estimator.measure().await;
///
/// // As real requests complete
/// estimator.record_observed_transfer(bytes, elapsed);
/// ```
///
/// # Thread Safety
///
/// The cache sits behind a `parking_lot::Mutex` that is never held across an
/// await point, so every update is a single atomic read-modify-write.
pub struct ThroughputEstimator {
    config: EstimatorConfig,
    probe: Option<Arc<dyn BandwidthProbe>>,
    cache: Mutex<Option<ThroughputSample>>,
}

impl std::fmt::Debug for ThroughputEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThroughputEstimator")
            .field("config", &self.config)
            .field("has_probe", &self.probe.is_some())
            .field("cached", &*self.cache.lock())
            .finish()
    }
}

impl ThroughputEstimator {
    /// Create an estimator that measures through `probe`.
    pub fn new(config: EstimatorConfig, probe: Arc<dyn BandwidthProbe>) -> Self {
        Self {
            config,
            probe: Some(probe),
            cache: Mutex::new(None),
        }
    }

    /// Create an estimator with no probe.
    ///
    /// It relies on the configured hint, observed traffic, and the fallback.
    pub fn without_probe(config: EstimatorConfig) -> Self {
        Self {
            config,
            probe: None,
            cache: Mutex::new(None),
        }
    }

    /// Get the estimator configuration.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Return a fresh estimate, measuring if the cached one has expired.
    ///
    /// Never fails: when neither a hint nor a calibration is available the
    /// conservative fallback is cached and returned, so a dead link does not
    /// trigger a recalibration on every call within the freshness window.
    pub async fn measure(&self) -> ThroughputSample {
        if let Some(sample) = self.fresh() {
            tracing::trace!(
                mbps = sample.mbps,
                source = %sample.source,
                "Using cached throughput estimate"
            );
            return sample;
        }

        if let Some(mbps) = self.platform_hint() {
            let sample = ThroughputSample::now(mbps, SampleSource::PlatformHint);
            tracing::debug!(mbps = sample.mbps, "Using platform bandwidth hint");
            return self.store(sample);
        }

        match self.calibrate().await {
            Ok(mbps) => {
                let sample = ThroughputSample::now(mbps, SampleSource::Calibration);
                tracing::info!(mbps = sample.mbps, "Throughput calibration complete");
                self.store(sample)
            }
            Err(e) => {
                let sample =
                    ThroughputSample::now(self.config.fallback_mbps, SampleSource::Fallback);
                tracing::warn!(
                    error = %e,
                    fallback_mbps = sample.mbps,
                    "Throughput calibration failed, using conservative estimate"
                );
                self.store(sample)
            }
        }
    }

    /// Fold a completed transfer into the estimate.
    ///
    /// The first sample becomes the estimate outright; later samples are
    /// smoothed as `old × (1 - w) + sample × w`. Zero-byte or zero-duration
    /// transfers carry no signal and are ignored.
    ///
    /// Returns the updated estimate, or `None` if the transfer was ignored.
    pub fn record_observed_transfer(
        &self,
        bytes: u64,
        duration: Duration,
    ) -> Option<ThroughputSample> {
        let Some(observed) = bytes_to_mbps(bytes, duration) else {
            tracing::trace!(bytes, ?duration, "Ignoring unmeasurable transfer");
            return None;
        };
        Some(self.record_observed_mbps(observed))
    }

    /// Fold an already-computed throughput figure into the estimate.
    pub fn record_observed_mbps(&self, mbps: f64) -> ThroughputSample {
        let observed = self.clamp(mbps);
        let weight = self.config.smoothing_weight;

        let mut cache = self.cache.lock();
        let smoothed = match *cache {
            Some(prev) => prev.mbps * (1.0 - weight) + observed * weight,
            None => observed,
        };
        let sample = ThroughputSample::now(smoothed, SampleSource::Observed);
        *cache = Some(sample);
        drop(cache);

        tracing::trace!(
            observed_mbps = observed,
            estimate_mbps = sample.mbps,
            "Updated throughput estimate from observed transfer"
        );
        sample
    }

    /// Replace the estimate with an explicit value.
    pub fn seed(&self, mbps: f64) -> ThroughputSample {
        self.store(ThroughputSample::now(mbps, SampleSource::Manual))
    }

    /// The cached sample regardless of age.
    pub fn cached(&self) -> Option<ThroughputSample> {
        *self.cache.lock()
    }

    /// The cached sample if it is inside the freshness window.
    pub fn fresh(&self) -> Option<ThroughputSample> {
        self.cached()
            .filter(|sample| sample.is_fresh(self.config.freshness))
    }

    /// Drop the cached estimate so the next `measure` starts over.
    pub fn clear(&self) {
        *self.cache.lock() = None;
    }

    fn store(&self, sample: ThroughputSample) -> ThroughputSample {
        *self.cache.lock() = Some(sample);
        sample
    }

    fn platform_hint(&self) -> Option<f64> {
        self.probe
            .as_ref()
            .and_then(|probe| probe.platform_hint())
            .or(self.config.bandwidth_hint_mbps)
            .filter(|mbps| mbps.is_finite() && *mbps >= 0.0)
    }

    async fn calibrate(&self) -> Result<f64, ProbeError> {
        let probe = self.probe.as_ref().ok_or(ProbeError::Unavailable)?;
        let timeout = self.config.calibration_timeout;

        let transfer = tokio::time::timeout(timeout, probe.calibrate())
            .await
            .map_err(|_| ProbeError::Timeout(timeout.as_millis() as u64))??;

        let raw = transfer.raw_mbps().ok_or_else(|| {
            ProbeError::InvalidTransfer(format!(
                "{} bytes in {:?}",
                transfer.bytes, transfer.elapsed
            ))
        })?;

        tracing::debug!(
            bytes = transfer.bytes,
            elapsed_ms = transfer.elapsed.as_millis() as u64,
            raw_mbps = raw,
            "Calibration transfer measured"
        );

        Ok(self.clamp(raw * self.config.calibration_correction))
    }

    /// Bound a figure to `[0, ceiling]`.
    ///
    /// The config may not have been validated, so a NaN ceiling leaves the
    /// value unbounded above rather than panicking.
    fn clamp(&self, mbps: f64) -> f64 {
        if mbps.is_nan() {
            return 0.0;
        }
        mbps.max(0.0).min(self.config.ceiling_mbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::probe::tests::MockProbe;

    fn config() -> EstimatorConfig {
        EstimatorConfig::default()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_measure_uses_calibration_with_correction() {
        // 125 KB in 1 s = 1 Mbps raw, × 1.5 correction
        let probe = Arc::new(MockProbe::transfer(125_000, Duration::from_secs(1)));
        let estimator = ThroughputEstimator::new(config(), probe.clone());

        let sample = estimator.measure().await;

        assert_eq!(sample.source, SampleSource::Calibration);
        assert!(approx(sample.mbps, 1.5));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_measure_clamps_to_ceiling() {
        // 1 GB in 1 s is far beyond the 100 Mbps ceiling
        let probe = Arc::new(MockProbe::transfer(1_000_000_000, Duration::from_secs(1)));
        let estimator = ThroughputEstimator::new(config(), probe);

        let sample = estimator.measure().await;
        assert!(approx(sample.mbps, 100.0));
    }

    #[tokio::test]
    async fn test_measure_returns_fresh_cache_without_probing() {
        let probe = Arc::new(MockProbe::transfer(125_000, Duration::from_secs(1)));
        let estimator = ThroughputEstimator::new(config(), probe.clone());

        let first = estimator.measure().await;
        let second = estimator.measure().await;

        assert_eq!(first, second);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_measure_reprobes_when_stale() {
        let probe = Arc::new(MockProbe::transfer(125_000, Duration::from_secs(1)));
        let estimator = ThroughputEstimator::new(
            EstimatorConfig {
                freshness: Duration::ZERO,
                ..config()
            },
            probe.clone(),
        );

        estimator.measure().await;
        estimator.measure().await;

        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test]
    async fn test_measure_prefers_platform_hint() {
        let mut probe = MockProbe::transfer(125_000, Duration::from_secs(1));
        probe.hint = Some(250.0);
        let probe = Arc::new(probe);
        let estimator = ThroughputEstimator::new(config(), probe.clone());

        let sample = estimator.measure().await;

        // Hints are trusted as-is, even above the ceiling
        assert_eq!(sample.source, SampleSource::PlatformHint);
        assert!(approx(sample.mbps, 250.0));
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_measure_uses_configured_hint_without_probe() {
        let estimator = ThroughputEstimator::without_probe(EstimatorConfig {
            bandwidth_hint_mbps: Some(7.0),
            ..config()
        });

        let sample = estimator.measure().await;
        assert_eq!(sample.source, SampleSource::PlatformHint);
        assert!(approx(sample.mbps, 7.0));
    }

    #[tokio::test]
    async fn test_measure_falls_back_and_caches_on_failure() {
        let probe = Arc::new(MockProbe::failing(ProbeError::Http(
            "connection refused".to_string(),
        )));
        let estimator = ThroughputEstimator::new(config(), probe.clone());

        let first = estimator.measure().await;
        let second = estimator.measure().await;

        assert_eq!(first.source, SampleSource::Fallback);
        assert!(approx(first.mbps, config().fallback_mbps));
        assert_eq!(first, second);
        assert_eq!(probe.calls(), 1, "fallback must be cached");
    }

    #[tokio::test]
    async fn test_measure_falls_back_on_timeout() {
        let mut probe = MockProbe::transfer(125_000, Duration::from_secs(1));
        probe.delay = Duration::from_millis(200);
        let estimator = ThroughputEstimator::new(
            EstimatorConfig {
                calibration_timeout: Duration::from_millis(20),
                ..config()
            },
            Arc::new(probe),
        );

        let sample = estimator.measure().await;
        assert_eq!(sample.source, SampleSource::Fallback);
    }

    #[tokio::test]
    async fn test_measure_falls_back_on_empty_transfer() {
        let probe = Arc::new(MockProbe::transfer(0, Duration::from_millis(50)));
        let estimator = ThroughputEstimator::new(config(), probe);

        assert_eq!(estimator.measure().await.source, SampleSource::Fallback);
    }

    #[tokio::test]
    async fn test_measure_without_probe_or_hint_falls_back() {
        let estimator = ThroughputEstimator::without_probe(config());
        assert_eq!(estimator.measure().await.source, SampleSource::Fallback);
    }

    #[test]
    fn test_first_observed_transfer_becomes_estimate() {
        let estimator = ThroughputEstimator::without_probe(config());

        // 250 KB in 1 s = 2 Mbps
        let sample = estimator
            .record_observed_transfer(250_000, Duration::from_secs(1))
            .unwrap();

        assert_eq!(sample.source, SampleSource::Observed);
        assert!(approx(sample.mbps, 2.0));
    }

    #[test]
    fn test_observed_transfers_are_smoothed() {
        let estimator = ThroughputEstimator::without_probe(config());
        let s1 = 2.0;
        let s2 = 8.0;

        estimator.record_observed_transfer(250_000, Duration::from_secs(1));
        estimator.record_observed_transfer(1_000_000, Duration::from_secs(1));

        let cached = estimator.cached().unwrap();
        assert!(approx(cached.mbps, s1 * 0.7 + s2 * 0.3), "got {}", cached.mbps);
    }

    #[test]
    fn test_observed_samples_clamped_to_ceiling() {
        let estimator = ThroughputEstimator::without_probe(config());

        let sample = estimator.record_observed_mbps(5000.0);
        assert!(approx(sample.mbps, 100.0));
    }

    #[test]
    fn test_unmeasurable_transfer_is_ignored() {
        let estimator = ThroughputEstimator::without_probe(config());

        assert!(estimator
            .record_observed_transfer(0, Duration::from_secs(1))
            .is_none());
        assert!(estimator
            .record_observed_transfer(1000, Duration::ZERO)
            .is_none());
        assert!(estimator.cached().is_none());
    }

    #[tokio::test]
    async fn test_smoothing_refreshes_stale_calibration() {
        let probe = Arc::new(MockProbe::transfer(125_000, Duration::from_secs(1)));
        let estimator = ThroughputEstimator::new(config(), probe.clone());

        estimator.measure().await;
        estimator.record_observed_mbps(10.0);
        let sample = estimator.measure().await;

        // 1.5 × 0.7 + 10 × 0.3
        assert_eq!(sample.source, SampleSource::Observed);
        assert!(approx(sample.mbps, 4.05));
        assert_eq!(probe.calls(), 1);
    }

    #[test]
    fn test_clear_and_seed() {
        let estimator = ThroughputEstimator::without_probe(config());

        estimator.seed(12.0);
        assert!(approx(estimator.cached().unwrap().mbps, 12.0));
        assert!(estimator.fresh().is_some());

        estimator.clear();
        assert!(estimator.cached().is_none());
        assert!(estimator.fresh().is_none());
    }

    #[test]
    fn test_cached_ignores_freshness() {
        let estimator = ThroughputEstimator::without_probe(EstimatorConfig {
            freshness: Duration::ZERO,
            ..config()
        });

        estimator.seed(3.0);
        assert!(estimator.cached().is_some());
        assert!(estimator.fresh().is_none());
    }

    #[tokio::test]
    async fn test_unvalidated_nan_ceiling_does_not_panic() {
        let nan_ceiling = EstimatorConfig {
            ceiling_mbps: f64::NAN,
            ..config()
        };

        let estimator = ThroughputEstimator::without_probe(nan_ceiling.clone());
        assert!(approx(estimator.record_observed_mbps(3.0).mbps, 3.0));
        assert!(approx(estimator.record_observed_mbps(-1.0).mbps, 2.1));

        let probe = Arc::new(MockProbe::transfer(125_000, Duration::from_secs(1)));
        let estimator = ThroughputEstimator::new(nan_ceiling, probe);
        let sample = estimator.measure().await;
        assert_eq!(sample.source, SampleSource::Calibration);
        assert!(approx(sample.mbps, 1.5));
    }
}
