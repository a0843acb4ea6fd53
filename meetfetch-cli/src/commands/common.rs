//! Common types and utilities shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use meetfetch::estimator::BandwidthProbe;
use meetfetch::source::{AsyncHttpClient, AsyncReqwestClient, HttpBandwidthProbe};
use meetfetch::{FetchConfig, ThroughputEstimator};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// Load configuration: an explicit `--config` must exist, otherwise the
/// default location is used if present.
pub fn load_config(path: Option<&Path>) -> Result<FetchConfig, CliError> {
    match path {
        Some(path) => Ok(FetchConfig::load(path)?),
        None => match meetfetch::config::default_config_path() {
            Some(path) => Ok(FetchConfig::load_or_default(&path)?),
            None => Ok(FetchConfig::default()),
        },
    }
}

/// Build the HTTP client with the configured request timeout.
pub fn http_client(config: &FetchConfig) -> Result<Arc<dyn AsyncHttpClient>, CliError> {
    let client = AsyncReqwestClient::with_timeout(config.http.request_timeout)?;
    Ok(Arc::new(client))
}

/// Build an estimator, with a calibration probe when a URL is given.
///
/// A `--hint-mbps` on the command line overrides any configured hint.
pub fn build_estimator(
    config: &FetchConfig,
    client: Arc<dyn AsyncHttpClient>,
    probe_url: Option<&str>,
    hint_mbps: Option<f64>,
) -> Result<ThroughputEstimator, CliError> {
    if let Some(mbps) = hint_mbps {
        if !mbps.is_finite() || mbps < 0.0 {
            return Err(CliError::Config(format!(
                "bandwidth hint must be a non-negative number, got {}",
                mbps
            )));
        }
    }

    let estimator = match probe_url {
        Some(url) => {
            let probe: Arc<dyn BandwidthProbe> =
                Arc::new(HttpBandwidthProbe::new(client, url).with_hint(hint_mbps));
            ThroughputEstimator::new(config.estimator.clone(), probe)
        }
        None => {
            let mut estimator_config = config.estimator.clone();
            if hint_mbps.is_some() {
                estimator_config.bandwidth_hint_mbps = hint_mbps;
            }
            ThroughputEstimator::without_probe(estimator_config)
        }
    };
    Ok(estimator)
}

/// Build a multi-threaded tokio runtime for a command.
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

/// Cancel `token` when the user presses Ctrl+C.
pub fn cancel_on_ctrlc(token: &CancellationToken) -> Result<(), CliError> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, stopping after the current round...");
        token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))
}
