use std::time::Duration;

use unicode_truncate::UnicodeTruncateStr;

use super::result::{Exchange, Measurement, ProbeOutcome, StatusClassification};

const BODY_PREVIEW_WIDTH: usize = 64;

/// What a healthy target is expected to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation<'a> {
    pub status_code: u16,
    pub body: &'a str,
    pub timeout: Duration,
}

/// Maps the result of the exchange onto exactly one status classification.
///
/// Measurements follow how far the exchange got: none on transport failure,
/// response time once headers arrived, body length once the body was read.
/// A wrong status code is reported even when the body is wrong too.
pub fn classify(exchange: Exchange, expected: &Expectation<'_>) -> ProbeOutcome {
    let (status, elapsed, body) = match exchange {
        Exchange::TimedOut => {
            log::debug!("Response timed out after {:?}", expected.timeout);
            return ProbeOutcome {
                status: StatusClassification::Timeout {
                    timeout_seconds: expected.timeout.as_secs(),
                },
                measurements: Vec::new(),
            };
        }
        Exchange::ConnectFailed { error } => {
            log::debug!("Connection failed: {}", error);
            return ProbeOutcome {
                status: StatusClassification::ConnectionFailed { error },
                measurements: Vec::new(),
            };
        }
        Exchange::Responded {
            status,
            elapsed,
            body,
        } => (status, elapsed, body),
    };

    let mut measurements = vec![Measurement::ResponseTime {
        milliseconds: elapsed.as_nanos() as f64 / 1_000_000.0,
    }];

    let body = match body {
        Ok(body) => body,
        Err(error) => {
            log::debug!("Reading response body failed: {}", error);
            return ProbeOutcome {
                status: StatusClassification::ReadBodyFailed {
                    response_status_code: status,
                    error,
                },
                measurements,
            };
        }
    };

    measurements.push(Measurement::ResponseBodyLength { bytes: body.len() });

    let classification = if status != expected.status_code {
        StatusClassification::StatusMismatch {
            response_status_code: status,
            expected_status_code: expected.status_code,
        }
    } else if body != expected.body.as_bytes() {
        let response_body = String::from_utf8_lossy(&body).into_owned();
        let (preview, _) = response_body.unicode_truncate(BODY_PREVIEW_WIDTH);
        log::debug!("Response body does not match, got {:?}", preview);
        StatusClassification::BodyMismatch {
            response_status_code: status,
            response_body,
            expected_body: expected.body.to_string(),
        }
    } else {
        StatusClassification::Success {
            response_status_code: status,
        }
    };

    ProbeOutcome {
        status: classification,
        measurements,
    }
}
