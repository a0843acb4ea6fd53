//! Network speed tiers.

use std::fmt;
use std::str::FromStr;

/// Discrete bucket of network speed used to choose a batch shape.
///
/// Variants are declared slowest first, so the derived `Ord` matches
/// increasing throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SpeedTier {
    /// Below the first threshold (default 0.5 Mbps).
    VerySlow,
    /// Typical of congested mobile links.
    #[default]
    Slow,
    /// Ordinary broadband or good 4G.
    Medium,
    /// Fast broadband.
    Fast,
    /// At or above the last threshold (default 10 Mbps).
    VeryFast,
}

impl SpeedTier {
    /// All tiers, slowest first.
    pub const ALL: [SpeedTier; 5] = [
        SpeedTier::VerySlow,
        SpeedTier::Slow,
        SpeedTier::Medium,
        SpeedTier::Fast,
        SpeedTier::VeryFast,
    ];

    /// Classify a throughput value against ascending tier thresholds.
    ///
    /// `thresholds[i]` is the lower bound of tier `i + 1`. The mapping is a
    /// monotonic step function and total: NaN and negative values land in
    /// [`SpeedTier::VerySlow`], anything at or above the last threshold in
    /// [`SpeedTier::VeryFast`].
    pub fn classify(mbps: f64, thresholds: &[f64; 4]) -> Self {
        if mbps.is_nan() {
            return SpeedTier::VerySlow;
        }
        let index = thresholds.iter().take_while(|&&t| mbps >= t).count();
        Self::ALL[index]
    }

    /// Position of this tier in [`SpeedTier::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Snake-case key used in configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            SpeedTier::VerySlow => "very_slow",
            SpeedTier::Slow => "slow",
            SpeedTier::Medium => "medium",
            SpeedTier::Fast => "fast",
            SpeedTier::VeryFast => "very_fast",
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            SpeedTier::VerySlow => "single small requests (very slow connection)",
            SpeedTier::Slow => "single small requests (slow connection)",
            SpeedTier::Medium => "paired medium requests (moderate connection)",
            SpeedTier::Fast => "three large requests in flight (fast connection)",
            SpeedTier::VeryFast => "four maximum-size requests in flight (very fast connection)",
        }
    }
}

impl fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedTier::VerySlow => write!(f, "very-slow"),
            SpeedTier::Slow => write!(f, "slow"),
            SpeedTier::Medium => write!(f, "medium"),
            SpeedTier::Fast => write!(f, "fast"),
            SpeedTier::VeryFast => write!(f, "very-fast"),
        }
    }
}

impl FromStr for SpeedTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "very-slow" => Ok(SpeedTier::VerySlow),
            "slow" => Ok(SpeedTier::Slow),
            "medium" => Ok(SpeedTier::Medium),
            "fast" => Ok(SpeedTier::Fast),
            "very-fast" => Ok(SpeedTier::VeryFast),
            other => Err(format!("unknown speed tier: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THRESHOLDS: [f64; 4] = [0.5, 1.0, 5.0, 10.0];

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(SpeedTier::classify(0.0, &THRESHOLDS), SpeedTier::VerySlow);
        assert_eq!(SpeedTier::classify(0.49, &THRESHOLDS), SpeedTier::VerySlow);
        assert_eq!(SpeedTier::classify(0.5, &THRESHOLDS), SpeedTier::Slow);
        assert_eq!(SpeedTier::classify(0.99, &THRESHOLDS), SpeedTier::Slow);
        assert_eq!(SpeedTier::classify(1.0, &THRESHOLDS), SpeedTier::Medium);
        assert_eq!(SpeedTier::classify(4.99, &THRESHOLDS), SpeedTier::Medium);
        assert_eq!(SpeedTier::classify(5.0, &THRESHOLDS), SpeedTier::Fast);
        assert_eq!(SpeedTier::classify(9.99, &THRESHOLDS), SpeedTier::Fast);
        assert_eq!(SpeedTier::classify(10.0, &THRESHOLDS), SpeedTier::VeryFast);
        assert_eq!(SpeedTier::classify(1e9, &THRESHOLDS), SpeedTier::VeryFast);
    }

    #[test]
    fn test_classify_degenerate_inputs() {
        assert_eq!(SpeedTier::classify(-3.0, &THRESHOLDS), SpeedTier::VerySlow);
        assert_eq!(SpeedTier::classify(f64::NAN, &THRESHOLDS), SpeedTier::VerySlow);
        assert_eq!(
            SpeedTier::classify(f64::INFINITY, &THRESHOLDS),
            SpeedTier::VeryFast
        );
    }

    #[test]
    fn test_tier_ordering() {
        assert!(SpeedTier::VerySlow < SpeedTier::Slow);
        assert!(SpeedTier::Slow < SpeedTier::Medium);
        assert!(SpeedTier::Medium < SpeedTier::Fast);
        assert!(SpeedTier::Fast < SpeedTier::VeryFast);
        for (i, tier) in SpeedTier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }

    #[test]
    fn test_tier_display_and_parse() {
        for tier in SpeedTier::ALL {
            assert_eq!(tier.to_string().parse::<SpeedTier>(), Ok(tier));
            assert_eq!(tier.key().parse::<SpeedTier>(), Ok(tier));
        }
        assert_eq!("VERY-FAST".parse::<SpeedTier>(), Ok(SpeedTier::VeryFast));
        assert!("warp".parse::<SpeedTier>().is_err());
    }

    proptest! {
        /// Higher throughput never yields a slower tier
        #[test]
        fn prop_classify_is_monotonic(a in 0.0f64..200.0, b in 0.0f64..200.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                SpeedTier::classify(lo, &THRESHOLDS) <= SpeedTier::classify(hi, &THRESHOLDS),
                "{} classified faster than {}", lo, hi
            );
        }

        /// Every non-negative value lands in the tier whose bounds contain it
        #[test]
        fn prop_classify_is_total(mbps in 0.0f64..1e6) {
            let tier = SpeedTier::classify(mbps, &THRESHOLDS);
            let i = tier.index();
            if i > 0 {
                prop_assert!(mbps >= THRESHOLDS[i - 1]);
            }
            if i < THRESHOLDS.len() {
                prop_assert!(mbps < THRESHOLDS[i]);
            }
        }
    }
}
