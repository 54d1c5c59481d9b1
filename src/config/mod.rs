pub mod app_config;
pub mod probe_config;

/// Errors raised while loading or validating the probe configuration.
/// Any of these aborts the run before the probe is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("error parsing url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("url {0} must use the http or https scheme")]
    UnsupportedScheme(String),

    #[error("{0} must be GET or POST")]
    InvalidMethod(&'static str),

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} must be a positive number")]
    NotPositive(&'static str),

    #[error("{0} must be between 100 and 599 (inclusive)")]
    StatusCodeOutOfRange(&'static str),

    #[error("header's key and value must be separated by '=': {0:?}")]
    MalformedHeader(String),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    #[error("BEARER_TOKEN cannot be combined with USERNAME/PASSWORD")]
    ConflictingAuth,

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in config file {path}: {source}")]
    InvalidYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
