//! Fetch command - load a paginated listing adaptively and print it.
//!
//! Records are written to stdout as JSON lines in listing order. Progress
//! and the session summary go to stderr so the output can be piped.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use meetfetch::fetch::{FetchSummary, ProgressCallback};
use meetfetch::source::{HttpPageFetcher, Meeting};
use meetfetch::{BatchFetchDriver, FetchConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::common::{build_estimator, cancel_on_ctrlc, http_client, runtime};
use crate::error::CliError;

const PB_STYLE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} {msg}";

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub url: String,
    pub total: usize,
    pub start: usize,
    pub probe_url: Option<String>,
    pub hint_mbps: Option<f64>,
    pub offset_param: String,
    pub limit_param: String,
    pub raw: bool,
    pub quiet: bool,
}

/// Run the fetch command.
pub fn run(config: &FetchConfig, args: FetchArgs) -> Result<(), CliError> {
    let client = http_client(config)?;
    let estimator = build_estimator(
        config,
        client.clone(),
        args.probe_url.as_deref(),
        args.hint_mbps,
    )?;
    let driver = BatchFetchDriver::from_config(config, Arc::new(estimator));

    let token = CancellationToken::new();
    cancel_on_ctrlc(&token)?;

    let rt = runtime()?;
    if args.raw {
        let fetcher = HttpPageFetcher::<serde_json::Value>::new(client, &args.url)
            .with_params(&args.offset_param, &args.limit_param);
        rt.block_on(load_and_print(&driver, &fetcher, &args, &token))
    } else {
        let fetcher = HttpPageFetcher::<Meeting>::new(client, &args.url)
            .with_params(&args.offset_param, &args.limit_param);
        rt.block_on(load_and_print(&driver, &fetcher, &args, &token))
    }
}

async fn load_and_print<T>(
    driver: &BatchFetchDriver,
    fetcher: &HttpPageFetcher<T>,
    args: &FetchArgs,
    token: &CancellationToken,
) -> Result<(), CliError>
where
    T: DeserializeOwned + Serialize + Send,
{
    let plan = driver.plan(args.total, args.start).await;
    tracing::info!(%plan, "Planned fetch");

    let bar = progress_bar(args.total as u64, args.quiet);
    let on_progress: ProgressCallback = {
        let bar = bar.clone();
        Box::new(move |loaded, _total, batch_size, tier| {
            bar.set_position(loaded as u64);
            bar.set_message(format!("{} tier, {} per request", tier, batch_size));
        })
    };

    let result = driver
        .run_with_plan_detailed(
            fetcher,
            plan,
            args.total,
            args.start,
            Some(&on_progress),
            token,
        )
        .await;

    match result {
        Ok(summary) => {
            bar.finish_and_clear();
            write_items(&summary.items)?;
            print_summary(&summary, args.start);
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e.into())
        }
    }
}

fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(pb_style) = ProgressStyle::with_template(PB_STYLE) {
        bar.set_style(pb_style.progress_chars("#>-"));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn write_items<T: Serialize>(items: &[T]) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    for item in items {
        serde_json::to_writer(&mut out, item).map_err(|e| CliError::Output(e.to_string()))?;
        writeln!(out).map_err(|e| CliError::Output(e.to_string()))?;
    }
    out.flush().map_err(|e| CliError::Output(e.to_string()))
}

fn print_summary<T>(summary: &FetchSummary<T>, start: usize) {
    eprintln!(
        "{} {} items in {} rounds ({})",
        style("Loaded").green().bold(),
        summary.items.len(),
        summary.rounds,
        summary.plan
    );
    if !summary.failed_batches.is_empty() {
        let skipped: usize = summary.failed_batches.iter().map(|b| b.count).sum();
        eprintln!(
            "{} {} pages failed, up to {} items skipped",
            style("Warning:").yellow().bold(),
            summary.failed_batches.len(),
            skipped
        );
    }
    if summary.exhausted {
        eprintln!(
            "{} listing ended before the expected total (stopped at offset {})",
            style("Note:").dim(),
            summary.next_offset.max(start)
        );
    }
}
