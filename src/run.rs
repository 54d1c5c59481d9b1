use crate::config::ConfigError;
use crate::config::probe_config::ProbeConfig;
use crate::http_probe::prelude::*;
use crate::metrics::create_probe_metrics;
use crate::remote_write::{SinkError, send_metrics};

/// Failures that abort a run. Probe failures are not among them: those are
/// reported as metrics and the run still succeeds.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("error creating API HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("error sending metrics: {0}")]
    Sink(#[from] SinkError),
}

/// Probes the configured API once and pushes the outcome to the metrics sink.
pub async fn run(config: &ProbeConfig) -> Result<ProbeOutcome, RunError> {
    let client = probe_client(config.response_timeout)?;
    let request = build_request(&client, config)?;

    let exchange = execute(&client, request).await;
    let outcome = classify(
        exchange,
        &Expectation {
            status_code: config.expected_status_code,
            body: &config.expected_body,
            timeout: config.response_timeout,
        },
    );

    if outcome.status.is_success() {
        log::info!("✅ {} {}: {:?}", config.method.as_str(), config.url, outcome.status);
    } else {
        log::warn!(
            "❌ {} {}: {}",
            config.method.as_str(),
            config.url,
            outcome.status.label()
        );
    }

    let records = create_probe_metrics(&outcome, config.url.as_str(), config.method.as_str());
    send_metrics(&config.sink, &records).await?;

    Ok(outcome)
}
