use std::time::Duration;

/// What came back from the single HTTP exchange of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// The transport gave up after the configured timeout.
    TimedOut,

    /// Any other transport failure: DNS, refused connection, TLS, ...
    ConnectFailed { error: String },

    /// Status and headers arrived; the body may or may not have been read.
    Responded {
        status: u16,
        elapsed: Duration,
        body: Result<Vec<u8>, String>,
    },
}

/// The single terminal outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClassification {
    Timeout {
        timeout_seconds: u64,
    },
    ConnectionFailed {
        error: String,
    },
    ReadBodyFailed {
        response_status_code: u16,
        error: String,
    },
    StatusMismatch {
        response_status_code: u16,
        expected_status_code: u16,
    },
    BodyMismatch {
        response_status_code: u16,
        response_body: String,
        expected_body: String,
    },
    Success {
        response_status_code: u16,
    },
}

impl StatusClassification {
    /// Value of the `status` label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            StatusClassification::Timeout { .. } => "timeout",
            StatusClassification::ConnectionFailed { .. } => "connection_failed",
            StatusClassification::ReadBodyFailed { .. } => "read_response_body_failed",
            StatusClassification::StatusMismatch { .. } => "no_match_status_code",
            StatusClassification::BodyMismatch { .. } => "no_match_response_body",
            StatusClassification::Success { .. } => "success",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusClassification::Success { .. })
    }
}

/// Secondary observations reported next to the classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    ResponseTime { milliseconds: f64 },
    ResponseBodyLength { bytes: usize },
}

/// Everything a run reports: one classification plus what was measured on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub status: StatusClassification,
    pub measurements: Vec<Measurement>,
}
