use std::collections::BTreeMap;

use crate::http_probe::result::{Measurement, ProbeOutcome, StatusClassification};

pub const STATUS_METRIC: &str = "api_status_status";
pub const RESPONSE_TIME_METRIC: &str = "api_status_response_time";
pub const RESPONSE_BODY_LENGTH_METRIC: &str = "api_status_response_body_length";

/// Value of every status series; it marks the outcome, it is not a magnitude.
pub const STATUS_METRIC_VALUE: f64 = 1.0;

const URL_LABEL: &str = "url";
const METHOD_LABEL: &str = "method";
const STATUS_LABEL: &str = "status";
const UNIT_LABEL: &str = "unit";
const ERROR_LABEL: &str = "error";
const RESPONSE_TIMEOUT_LABEL: &str = "response_timeout";
const RESPONSE_TIMEOUT_UNIT_LABEL: &str = "response_timeout_unit";
const RESPONSE_STATUS_CODE_LABEL: &str = "response_status_code";
const EXPECTED_RESPONSE_STATUS_CODE_LABEL: &str = "expected_response_status_code";
const RESPONSE_BODY_LABEL: &str = "response_body";
const EXPECTED_RESPONSE_BODY_LABEL: &str = "expected_response_body";

const SECONDS_UNIT: &str = "seconds";
const MILLISECONDS_UNIT: &str = "milliseconds";
const BYTES_UNIT: &str = "bytes";

/// A single sample ready to be handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub value: f64,
    pub labels: BTreeMap<String, String>,
}

impl MetricRecord {
    fn new(name: &str, value: f64, url: &str, method: &str) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(URL_LABEL.to_string(), url.to_string());
        labels.insert(METHOD_LABEL.to_string(), method.to_string());
        MetricRecord {
            name: name.to_string(),
            value,
            labels,
        }
    }

    fn with_label(mut self, name: &str, value: impl Into<String>) -> Self {
        self.labels.insert(name.to_string(), value.into());
        self
    }

    #[cfg(test)]
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// Builds the status series for a classification.
pub fn status_record(status: &StatusClassification, url: &str, method: &str) -> MetricRecord {
    let record = MetricRecord::new(STATUS_METRIC, STATUS_METRIC_VALUE, url, method)
        .with_label(STATUS_LABEL, status.label());

    match status {
        StatusClassification::Timeout { timeout_seconds } => record
            .with_label(RESPONSE_TIMEOUT_LABEL, timeout_seconds.to_string())
            .with_label(RESPONSE_TIMEOUT_UNIT_LABEL, SECONDS_UNIT),
        StatusClassification::ConnectionFailed { error } => {
            record.with_label(ERROR_LABEL, error.as_str())
        }
        StatusClassification::ReadBodyFailed {
            response_status_code,
            error,
        } => record
            .with_label(RESPONSE_STATUS_CODE_LABEL, response_status_code.to_string())
            .with_label(ERROR_LABEL, error.as_str()),
        StatusClassification::StatusMismatch {
            response_status_code,
            expected_status_code,
        } => record
            .with_label(RESPONSE_STATUS_CODE_LABEL, response_status_code.to_string())
            .with_label(
                EXPECTED_RESPONSE_STATUS_CODE_LABEL,
                expected_status_code.to_string(),
            ),
        StatusClassification::BodyMismatch {
            response_status_code,
            response_body,
            expected_body,
        } => record
            .with_label(RESPONSE_STATUS_CODE_LABEL, response_status_code.to_string())
            .with_label(RESPONSE_BODY_LABEL, response_body.as_str())
            .with_label(EXPECTED_RESPONSE_BODY_LABEL, expected_body.as_str()),
        StatusClassification::Success {
            response_status_code,
        } => record.with_label(RESPONSE_STATUS_CODE_LABEL, response_status_code.to_string()),
    }
}

/// Builds the series for an auxiliary measurement.
pub fn measurement_record(measurement: &Measurement, url: &str, method: &str) -> MetricRecord {
    match measurement {
        Measurement::ResponseTime { milliseconds } => {
            MetricRecord::new(RESPONSE_TIME_METRIC, *milliseconds, url, method)
                .with_label(UNIT_LABEL, MILLISECONDS_UNIT)
        }
        Measurement::ResponseBodyLength { bytes } => {
            MetricRecord::new(RESPONSE_BODY_LENGTH_METRIC, *bytes as f64, url, method)
                .with_label(UNIT_LABEL, BYTES_UNIT)
        }
    }
}

/// Creates every record of a run: the measurements in the order they were taken,
/// followed by the single status record.
pub fn create_probe_metrics(outcome: &ProbeOutcome, url: &str, method: &str) -> Vec<MetricRecord> {
    log::debug!("Building metrics for {} ({} measurements)", url, outcome.measurements.len());

    outcome
        .measurements
        .iter()
        .map(|measurement| measurement_record(measurement, url, method))
        .chain(std::iter::once(status_record(&outcome.status, url, method)))
        .collect()
}
