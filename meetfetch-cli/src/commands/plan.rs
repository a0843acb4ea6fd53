//! Plan command - compute a loading plan without fetching anything.

use clap::ValueEnum;
use console::style;
use meetfetch::{FetchConfig, LoadingPlan, PlanCalculator, SpeedTier};

use crate::error::CliError;

/// Speed tier selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum TierArg {
    VerySlow,
    Slow,
    Medium,
    Fast,
    VeryFast,
}

impl From<TierArg> for SpeedTier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::VerySlow => SpeedTier::VerySlow,
            TierArg::Slow => SpeedTier::Slow,
            TierArg::Medium => SpeedTier::Medium,
            TierArg::Fast => SpeedTier::Fast,
            TierArg::VeryFast => SpeedTier::VeryFast,
        }
    }
}

/// Arguments for the plan command.
pub struct PlanArgs {
    pub total: usize,
    pub loaded: usize,
    pub mbps: Option<f64>,
    pub tier: Option<TierArg>,
}

/// Compute the plan the arguments describe.
///
/// An explicit tier wins over a throughput figure; with neither, the
/// default tier is used.
pub fn compute(config: &FetchConfig, args: &PlanArgs) -> LoadingPlan {
    let calculator = PlanCalculator::new(config);
    match (args.tier, args.mbps) {
        (Some(tier), _) => calculator.build_loading_plan(tier.into(), args.total, args.loaded),
        (None, Some(mbps)) => calculator.plan_for_throughput(mbps, args.total, args.loaded),
        (None, None) => {
            calculator.build_loading_plan(SpeedTier::default(), args.total, args.loaded)
        }
    }
}

/// Run the plan command.
pub fn run(config: &FetchConfig, args: PlanArgs) -> Result<(), CliError> {
    let plan = compute(config, &args);

    println!("{}", style("Loading plan").bold());
    if let Some(mbps) = plan.throughput_mbps {
        println!("  Speed:       {:.2} Mbps", mbps);
    }
    println!("  Tier:        {} ({})", style(plan.tier).cyan(), plan.tier.description());
    println!("  Remaining:   {} of {}", plan.remaining_items, args.total);
    println!("  Batch size:  {}", plan.batch_size);
    println!("  Parallelism: {}", plan.parallelism);
    println!("  Requests:    {}", plan.batch_count);
    println!("  Rounds:      {}", plan.round_count);

    Ok(())
}
