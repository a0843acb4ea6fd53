//! Measure command - estimate throughput and show the resulting tier.

use console::style;
use meetfetch::{FetchConfig, PlanCalculator};

use super::common::{build_estimator, http_client, runtime};
use crate::error::CliError;

/// Arguments for the measure command.
pub struct MeasureArgs {
    pub probe_url: Option<String>,
    pub hint_mbps: Option<f64>,
}

/// Run the measure command.
pub fn run(config: &FetchConfig, args: MeasureArgs) -> Result<(), CliError> {
    let client = http_client(config)?;
    let estimator = build_estimator(
        config,
        client,
        args.probe_url.as_deref(),
        args.hint_mbps,
    )?;

    let sample = runtime()?.block_on(estimator.measure());
    let calculator = PlanCalculator::new(config);
    let tier = calculator.classify(sample.mbps);
    let plan = calculator.plan(tier);

    println!("{}", style("Throughput estimate").bold());
    println!("  Speed:       {:.2} Mbps", sample.mbps);
    println!("  Source:      {}", sample.source);
    println!("  Tier:        {} ({})", style(tier).cyan(), tier.description());
    println!("  Batch size:  {}", plan.batch_size);
    println!("  Parallelism: {}", plan.parallelism);

    Ok(())
}
