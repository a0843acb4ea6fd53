//! Calibration probe over HTTP.

use std::sync::Arc;
use std::time::Instant;

use super::http::{AsyncHttpClient, HttpError};
use crate::estimator::{BandwidthProbe, CalibrationTransfer, ProbeError};
use crate::BoxFuture;

/// Times a GET against a small, fast endpoint.
///
/// The payload content is ignored; only its size and the elapsed time
/// matter. An optional declared bandwidth stands in for a platform hint.
pub struct HttpBandwidthProbe {
    client: Arc<dyn AsyncHttpClient>,
    url: String,
    hint_mbps: Option<f64>,
}

impl HttpBandwidthProbe {
    /// Create a probe that calibrates against `url`.
    pub fn new(client: Arc<dyn AsyncHttpClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            hint_mbps: None,
        }
    }

    /// Report `mbps` as the platform's declared bandwidth.
    pub fn with_hint(mut self, mbps: Option<f64>) -> Self {
        self.hint_mbps = mbps;
        self
    }

    /// The calibration endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl BandwidthProbe for HttpBandwidthProbe {
    fn platform_hint(&self) -> Option<f64> {
        self.hint_mbps
    }

    fn calibrate(&self) -> BoxFuture<'_, Result<CalibrationTransfer, ProbeError>> {
        Box::pin(async move {
            let started = Instant::now();
            let response = self.client.get(&self.url).await.map_err(|e| match e {
                HttpError::Timeout => ProbeError::Timeout(started.elapsed().as_millis() as u64),
                other => ProbeError::Http(other.to_string()),
            })?;
            let elapsed = started.elapsed();

            if !response.is_success() {
                return Err(ProbeError::Status {
                    status: response.status,
                    url: self.url.clone(),
                });
            }

            Ok(CalibrationTransfer {
                bytes: response.body.len() as u64,
                elapsed,
            })
        })
    }
}
