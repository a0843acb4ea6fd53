//! Tuning configuration for adaptive batch loading.
//!
//! Every constant the estimator, classifier, plan calculator and driver use
//! lives here with a default, so a deployment can retune the loader without
//! touching code.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [batch]
//! min_size = 5
//! max_size = 100
//!
//! [tiers]
//! threshold_medium = 1.0
//! batch_fast = 30
//! parallelism_very_fast = 4
//!
//! [estimator]
//! freshness_secs = 60
//! smoothing_weight = 0.3
//! bandwidth_hint_mbps = 12.5
//!
//! [http]
//! request_timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;

use crate::plan::SpeedTier;

/// Minimum items per page request.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 5;

/// Maximum items per page request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Batch size used when a tier's table entry is left at zero.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// How long a throughput estimate is trusted before re-measuring.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

/// Weight given to a new sample in exponential smoothing.
pub const DEFAULT_SMOOTHING_WEIGHT: f64 = 0.3;

/// Multiplier applied to calibration results.
///
/// Calibration payloads are small, so fixed request latency dominates the
/// measured time and the raw figure underestimates the link.
pub const DEFAULT_CALIBRATION_CORRECTION: f64 = 1.5;

/// Upper sanity bound for any single throughput figure (Mbps).
pub const DEFAULT_CEILING_MBPS: f64 = 100.0;

/// Estimate used when neither a hint nor a calibration is available (Mbps).
pub const DEFAULT_FALLBACK_MBPS: f64 = 0.75;

/// Upper bound on a calibration transfer.
pub const DEFAULT_CALIBRATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request timeout for page fetches over HTTP.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The INI file could not be read or parsed.
    #[error("failed to load config {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// A key held a value that does not parse.
    #[error("invalid value for [{section}] {key}: {value:?}")]
    Invalid {
        section: String,
        key: String,
        value: String,
    },

    /// Values parsed but are inconsistent with each other.
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Bounds on the number of items requested per page.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub min_batch_size: usize,
    pub max_batch_size: usize,
    pub default_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            default_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Per-tier classification thresholds and plan tables.
///
/// `thresholds[i]` is the lower bound (Mbps) of tier `i + 1`, so the four
/// values separate the five tiers. `batch_sizes` and `parallelism` are
/// indexed by [`SpeedTier::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct TierTable {
    pub thresholds: [f64; 4],
    pub batch_sizes: [usize; 5],
    pub parallelism: [usize; 5],
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            thresholds: [0.5, 1.0, 5.0, 10.0],
            batch_sizes: [5, 5, 15, 30, 50],
            parallelism: [1, 1, 2, 3, 4],
        }
    }
}

/// Throughput estimator tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Age below which a cached estimate is returned without re-measuring.
    pub freshness: Duration,
    /// Weight of a new sample when smoothing (0, 1].
    pub smoothing_weight: f64,
    /// Multiplier applied to calibration measurements.
    pub calibration_correction: f64,
    /// Sanity ceiling for calibration and observed samples.
    pub ceiling_mbps: f64,
    /// Estimate cached when measuring fails outright.
    pub fallback_mbps: f64,
    /// Maximum time a calibration transfer may take.
    pub calibration_timeout: Duration,
    /// Declared bandwidth supplied by the host, if any.
    pub bandwidth_hint_mbps: Option<f64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            freshness: DEFAULT_FRESHNESS,
            smoothing_weight: DEFAULT_SMOOTHING_WEIGHT,
            calibration_correction: DEFAULT_CALIBRATION_CORRECTION,
            ceiling_mbps: DEFAULT_CEILING_MBPS,
            fallback_mbps: DEFAULT_FALLBACK_MBPS,
            calibration_timeout: DEFAULT_CALIBRATION_TIMEOUT,
            bandwidth_hint_mbps: None,
        }
    }
}

/// HTTP collaborator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Top-level loader configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchConfig {
    pub batch: BatchConfig,
    pub tiers: TierTable,
    pub estimator: EstimatorConfig,
    pub http: HttpConfig,
}

impl FetchConfig {
    /// Load configuration from an INI file.
    ///
    /// Keys that are absent keep their defaults. The result is validated
    /// before it is returned.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        config.apply_ini(&ini)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded fetch configuration");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let batch = &self.batch;
        if batch.min_batch_size == 0 {
            return Err(ConfigError::Inconsistent(
                "min batch size must be at least 1".to_string(),
            ));
        }
        if batch.min_batch_size > batch.max_batch_size {
            return Err(ConfigError::Inconsistent(format!(
                "min batch size {} exceeds max batch size {}",
                batch.min_batch_size, batch.max_batch_size
            )));
        }

        let t = &self.tiers.thresholds;
        if t.iter().any(|v| !v.is_finite() || *v < 0.0) || t.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Inconsistent(format!(
                "tier thresholds must be non-negative and strictly ascending, got {:?}",
                t
            )));
        }

        let weight = self.estimator.smoothing_weight;
        if !(weight > 0.0 && weight <= 1.0) {
            return Err(ConfigError::Inconsistent(format!(
                "smoothing weight must be in (0, 1], got {}",
                weight
            )));
        }

        let estimator = &self.estimator;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(estimator.ceiling_mbps) || !positive(estimator.calibration_correction) {
            return Err(ConfigError::Inconsistent(format!(
                "ceiling and calibration correction must be positive and finite, got {} and {}",
                estimator.ceiling_mbps, estimator.calibration_correction
            )));
        }
        if !(estimator.fallback_mbps.is_finite() && estimator.fallback_mbps >= 0.0) {
            return Err(ConfigError::Inconsistent(format!(
                "fallback estimate must be non-negative and finite, got {}",
                estimator.fallback_mbps
            )));
        }

        Ok(())
    }

    fn apply_ini(&mut self, ini: &Ini) -> Result<(), ConfigError> {
        if let Some(section) = ini.section(Some("batch")) {
            let s = Section::new("batch", section);
            s.set(&mut self.batch.min_batch_size, "min_size")?;
            s.set(&mut self.batch.max_batch_size, "max_size")?;
            s.set(&mut self.batch.default_batch_size, "default_size")?;
        }

        if let Some(section) = ini.section(Some("tiers")) {
            let s = Section::new("tiers", section);
            for (i, tier) in SpeedTier::ALL.iter().enumerate() {
                if i > 0 {
                    s.set(
                        &mut self.tiers.thresholds[i - 1],
                        &format!("threshold_{}", tier.key()),
                    )?;
                }
                s.set(
                    &mut self.tiers.batch_sizes[i],
                    &format!("batch_{}", tier.key()),
                )?;
                s.set(
                    &mut self.tiers.parallelism[i],
                    &format!("parallelism_{}", tier.key()),
                )?;
            }
        }

        if let Some(section) = ini.section(Some("estimator")) {
            let s = Section::new("estimator", section);
            s.set_secs(&mut self.estimator.freshness, "freshness_secs")?;
            s.set(&mut self.estimator.smoothing_weight, "smoothing_weight")?;
            s.set(
                &mut self.estimator.calibration_correction,
                "calibration_correction",
            )?;
            s.set(&mut self.estimator.ceiling_mbps, "ceiling_mbps")?;
            s.set(&mut self.estimator.fallback_mbps, "fallback_mbps")?;
            s.set_secs(
                &mut self.estimator.calibration_timeout,
                "calibration_timeout_secs",
            )?;
            if let Some(hint) = s.get::<f64>("bandwidth_hint_mbps")? {
                self.estimator.bandwidth_hint_mbps = Some(hint);
            }
        }

        if let Some(section) = ini.section(Some("http")) {
            let s = Section::new("http", section);
            s.set_secs(&mut self.http.request_timeout, "request_timeout_secs")?;
        }

        Ok(())
    }
}

/// Typed accessors over one INI section.
struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, props: &'a Properties) -> Self {
        Self { name, props }
    }

    fn get<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.props.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::Invalid {
                    section: self.name.to_string(),
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    fn set<T: FromStr>(&self, target: &mut T, key: &str) -> Result<(), ConfigError> {
        if let Some(value) = self.get(key)? {
            *target = value;
        }
        Ok(())
    }

    fn set_secs(&self, target: &mut Duration, key: &str) -> Result<(), ConfigError> {
        if let Some(secs) = self.get::<u64>(key)? {
            *target = Duration::from_secs(secs);
        }
        Ok(())
    }
}

/// Default location of the config file (`<config dir>/meetfetch/config.ini`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("meetfetch").join("config.ini"))
}
