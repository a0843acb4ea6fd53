//! Batch size and parallelism selection.
//!
//! Maps a [`SpeedTier`] to the shape of each loading round and derives the
//! advisory figures (batch and round counts) used for progress estimates.

use std::fmt;

use super::tier::SpeedTier;
use crate::config::{BatchConfig, FetchConfig, TierTable};

/// Shape of every round in a loading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    /// Items requested per page fetch.
    pub batch_size: usize,
    /// Page fetches in flight per round.
    pub parallelism: usize,
}

impl BatchPlan {
    /// Maximum items a single round can yield.
    pub fn round_capacity(&self) -> usize {
        self.batch_size * self.parallelism
    }
}

/// Immutable plan for one loading session.
///
/// `batch_count` and `round_count` are estimates for progress reporting;
/// the driver stops on its own exhaustion and cancellation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingPlan {
    pub batch_size: usize,
    pub parallelism: usize,
    pub remaining_items: usize,
    pub batch_count: usize,
    pub round_count: usize,
    pub tier: SpeedTier,
    /// Throughput the tier was chosen from, when known.
    pub throughput_mbps: Option<f64>,
}

impl LoadingPlan {
    /// Shape of each round.
    pub fn batch_plan(&self) -> BatchPlan {
        BatchPlan {
            batch_size: self.batch_size,
            parallelism: self.parallelism,
        }
    }

    /// Whether nothing remains to load.
    pub fn is_empty(&self) -> bool {
        self.remaining_items == 0
    }
}

impl fmt::Display for LoadingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tier: {} items in {} batches of {} ({} rounds, {} in flight)",
            self.tier,
            self.remaining_items,
            self.batch_count,
            self.batch_size,
            self.round_count,
            self.parallelism
        )
    }
}

/// Pure mapping from speed tier to loading plan.
#[derive(Debug, Clone, Default)]
pub struct PlanCalculator {
    batch: BatchConfig,
    tiers: TierTable,
}

impl PlanCalculator {
    /// Create a calculator from the loader configuration.
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            batch: config.batch.clone(),
            tiers: config.tiers.clone(),
        }
    }

    /// Classify a throughput value with this calculator's thresholds.
    pub fn classify(&self, mbps: f64) -> SpeedTier {
        SpeedTier::classify(mbps, &self.tiers.thresholds)
    }

    /// Batch size and parallelism for a tier.
    ///
    /// A zero batch-size table entry falls back to the configured default.
    /// The batch size is clamped to `[min, max]` and parallelism is at
    /// least 1.
    pub fn plan(&self, tier: SpeedTier) -> BatchPlan {
        let raw = match self.tiers.batch_sizes[tier.index()] {
            0 => self.batch.default_batch_size,
            size => size,
        };
        let max = self.batch.max_batch_size.max(self.batch.min_batch_size);
        let batch_size = raw.clamp(self.batch.min_batch_size, max).max(1);
        let parallelism = self.tiers.parallelism[tier.index()].max(1);

        BatchPlan {
            batch_size,
            parallelism,
        }
    }

    /// Full plan for loading `total - loaded` remaining items at `tier`.
    pub fn build_loading_plan(&self, tier: SpeedTier, total: usize, loaded: usize) -> LoadingPlan {
        let BatchPlan {
            batch_size,
            parallelism,
        } = self.plan(tier);
        let remaining_items = total.saturating_sub(loaded);
        let batch_count = remaining_items.div_ceil(batch_size);
        let round_count = batch_count.div_ceil(parallelism);

        LoadingPlan {
            batch_size,
            parallelism,
            remaining_items,
            batch_count,
            round_count,
            tier,
            throughput_mbps: None,
        }
    }

    /// Classify `mbps` and build the plan in one step.
    pub fn plan_for_throughput(&self, mbps: f64, total: usize, loaded: usize) -> LoadingPlan {
        let tier = self.classify(mbps);
        LoadingPlan {
            throughput_mbps: Some(mbps),
            ..self.build_loading_plan(tier, total, loaded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn calculator() -> PlanCalculator {
        PlanCalculator::new(&FetchConfig::default())
    }

    fn any_tier() -> impl Strategy<Value = SpeedTier> {
        (0usize..5).prop_map(|i| SpeedTier::ALL[i])
    }

    #[test]
    fn test_default_tables() {
        let calc = calculator();
        let expected = [(5, 1), (5, 1), (15, 2), (30, 3), (50, 4)];
        for (tier, (batch_size, parallelism)) in SpeedTier::ALL.iter().zip(expected) {
            assert_eq!(
                calc.plan(*tier),
                BatchPlan {
                    batch_size,
                    parallelism
                },
                "tier {}",
                tier
            );
        }
    }

    #[test]
    fn test_plan_clamps_batch_size() {
        let mut config = FetchConfig::default();
        config.tiers.batch_sizes = [1, 5, 15, 30, 500];
        config.batch.max_batch_size = 40;
        let calc = PlanCalculator::new(&config);

        assert_eq!(calc.plan(SpeedTier::VerySlow).batch_size, 5);
        assert_eq!(calc.plan(SpeedTier::VeryFast).batch_size, 40);
    }

    #[test]
    fn test_plan_zero_entry_uses_default_batch_size() {
        let mut config = FetchConfig::default();
        config.tiers.batch_sizes[2] = 0;
        config.batch.default_batch_size = 8;
        let calc = PlanCalculator::new(&config);

        assert_eq!(calc.plan(SpeedTier::Medium).batch_size, 8);
    }

    #[test]
    fn test_plan_parallelism_at_least_one() {
        let mut config = FetchConfig::default();
        config.tiers.parallelism = [0, 0, 0, 0, 0];
        let calc = PlanCalculator::new(&config);

        for tier in SpeedTier::ALL {
            assert_eq!(calc.plan(tier).parallelism, 1);
        }
    }

    #[test]
    fn test_build_loading_plan_counts() {
        let plan = calculator().build_loading_plan(SpeedTier::Medium, 23, 0);

        assert_eq!(plan.batch_size, 15);
        assert_eq!(plan.parallelism, 2);
        assert_eq!(plan.remaining_items, 23);
        assert_eq!(plan.batch_count, 2);
        assert_eq!(plan.round_count, 1);
        assert_eq!(plan.tier, SpeedTier::Medium);
    }

    #[test]
    fn test_build_loading_plan_with_loaded_items() {
        let plan = calculator().build_loading_plan(SpeedTier::Fast, 200, 50);

        // 150 remaining / 30 per batch = 5 batches, 3 in flight = 2 rounds
        assert_eq!(plan.remaining_items, 150);
        assert_eq!(plan.batch_count, 5);
        assert_eq!(plan.round_count, 2);
    }

    #[test]
    fn test_build_loading_plan_nothing_remaining() {
        let plan = calculator().build_loading_plan(SpeedTier::Slow, 10, 25);

        assert!(plan.is_empty());
        assert_eq!(plan.batch_count, 0);
        assert_eq!(plan.round_count, 0);
    }

    #[test]
    fn test_plan_for_throughput_records_estimate() {
        let plan = calculator().plan_for_throughput(7.5, 100, 0);

        assert_eq!(plan.tier, SpeedTier::Fast);
        assert_eq!(plan.throughput_mbps, Some(7.5));
        assert_eq!(plan.batch_plan().round_capacity(), 90);
    }

    #[test]
    fn test_loading_plan_display() {
        let plan = calculator().build_loading_plan(SpeedTier::Medium, 23, 0);
        assert_eq!(
            plan.to_string(),
            "medium tier: 23 items in 2 batches of 15 (1 rounds, 2 in flight)"
        );
    }

    proptest! {
        /// Batch size always respects the configured bounds
        #[test]
        fn prop_batch_size_within_bounds(tier in any_tier()) {
            let config = FetchConfig::default();
            let plan = PlanCalculator::new(&config).plan(tier);
            prop_assert!(plan.batch_size >= config.batch.min_batch_size);
            prop_assert!(plan.batch_size <= config.batch.max_batch_size);
        }

        /// Planning is a pure function of the tier
        #[test]
        fn prop_plan_is_pure(tier in any_tier()) {
            let calc = calculator();
            prop_assert_eq!(calc.plan(tier), calc.plan(tier));
        }

        /// Faster tiers never get smaller rounds
        #[test]
        fn prop_round_capacity_monotonic(a in any_tier(), b in any_tier()) {
            let calc = calculator();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(calc.plan(lo).round_capacity() <= calc.plan(hi).round_capacity());
        }

        /// Batches cover the remaining items without a spare batch
        #[test]
        fn prop_batch_count_covers_remaining(
            tier in any_tier(),
            total in 0usize..5000,
            loaded in 0usize..5000
        ) {
            let plan = calculator().build_loading_plan(tier, total, loaded);
            prop_assert!(plan.batch_count * plan.batch_size >= plan.remaining_items);
            if plan.batch_count > 0 {
                prop_assert!((plan.batch_count - 1) * plan.batch_size < plan.remaining_items);
            }
            prop_assert!(plan.round_count * plan.parallelism >= plan.batch_count);
        }
    }
}
