pub mod client;
pub mod prompb;

pub use client::send_metrics;

/// Failures while delivering metrics. Any of these fails the run.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to compress write request: {0}")]
    Compress(#[from] snap::Error),

    #[error("invalid metrics token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to push metrics: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to push metrics: {status} - {body}")]
    Rejected { status: u16, body: String },
}
