//! meetfetch CLI - Command-line interface
//!
//! Measures link throughput, previews loading plans and fetches paginated
//! meeting listings with adaptive batching.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use meetfetch::logging::{init_logging, LogSettings};

use commands::fetch::FetchArgs;
use commands::measure::MeasureArgs;
use commands::plan::{PlanArgs, TierArg};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "meetfetch")]
#[command(
    about = "Adaptive, bandwidth-aware loader for paginated meeting listings",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Path to an INI configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Estimate throughput and show the speed tier it maps to
    Measure {
        /// URL of a small, fast endpoint to time
        #[arg(long)]
        probe_url: Option<String>,

        /// Declared bandwidth in Mbps, used instead of calibrating
        #[arg(long)]
        hint_mbps: Option<f64>,
    },

    /// Show the loading plan for a listing without fetching it
    Plan {
        /// Total items in the listing
        #[arg(long)]
        total: usize,

        /// Items already loaded
        #[arg(long, default_value_t = 0)]
        loaded: usize,

        /// Throughput to plan for, in Mbps
        #[arg(long, conflicts_with = "tier")]
        mbps: Option<f64>,

        /// Plan for a specific speed tier
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
    },

    /// Fetch a paginated listing and print records as JSON lines
    Fetch {
        /// Listing endpoint; pages are requested with offset/limit parameters
        #[arg(long)]
        url: String,

        /// Total items the listing reports
        #[arg(long)]
        total: usize,

        /// Offset to start from
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// URL of a small, fast endpoint used for calibration
        #[arg(long)]
        probe_url: Option<String>,

        /// Declared bandwidth in Mbps, used instead of calibrating
        #[arg(long)]
        hint_mbps: Option<f64>,

        /// Query parameter carrying the offset
        #[arg(long, default_value = "offset")]
        offset_param: String,

        /// Query parameter carrying the page size
        #[arg(long, default_value = "limit")]
        limit_param: String,

        /// Print records as untyped JSON instead of meeting records
        #[arg(long)]
        raw: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut settings = LogSettings::new(cli.verbose);
    if let Some(path) = &cli.log_file {
        settings = settings.with_log_file(path);
    }
    let _guard = match init_logging(&settings) {
        Ok(guard) => guard,
        Err(e) => {
            let e = CliError::from(e);
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = commands::common::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Measure {
            probe_url,
            hint_mbps,
        } => commands::measure::run(
            &config,
            MeasureArgs {
                probe_url,
                hint_mbps,
            },
        ),
        Commands::Plan {
            total,
            loaded,
            mbps,
            tier,
        } => commands::plan::run(
            &config,
            PlanArgs {
                total,
                loaded,
                mbps,
                tier,
            },
        ),
        Commands::Fetch {
            url,
            total,
            start,
            probe_url,
            hint_mbps,
            offset_param,
            limit_param,
            raw,
            quiet,
        } => commands::fetch::run(
            &config,
            FetchArgs {
                url,
                total,
                start,
                probe_url,
                hint_mbps,
                offset_param,
                limit_param,
                raw,
                quiet,
            },
        ),
    }
}
