use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::ConfigError;

pub const API_URL_KEY: &str = "API_URL";
pub const METHOD_KEY: &str = "METHOD";
pub const HEADERS_KEY: &str = "HEADERS";
pub const BODY_KEY: &str = "BODY";
pub const BEARER_TOKEN_KEY: &str = "BEARER_TOKEN";
pub const USERNAME_KEY: &str = "USERNAME";
pub const PASSWORD_KEY: &str = "PASSWORD";
pub const API_RESPONSE_TIMEOUT_KEY: &str = "API_RESPONSE_TIMEOUT";
pub const EXPECTED_STATUS_CODE_KEY: &str = "EXPECTED_STATUS_CODE";
pub const EXPECTED_BODY_KEY: &str = "EXPECTED_BODY";
pub const METRICS_LISTENER_KEY: &str = "METRICS_LISTENER";
pub const METRICS_TOKEN_KEY: &str = "METRICS_TOKEN";
pub const AWS_REGION_KEY: &str = "AWS_REGION";
pub const AWS_LAMBDA_FUNCTION_NAME_KEY: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Every key the loader reads, used to layer the YAML file under the environment.
pub const ALL_KEYS: [&str; 14] = [
    API_URL_KEY,
    METHOD_KEY,
    HEADERS_KEY,
    BODY_KEY,
    BEARER_TOKEN_KEY,
    USERNAME_KEY,
    PASSWORD_KEY,
    API_RESPONSE_TIMEOUT_KEY,
    EXPECTED_STATUS_CODE_KEY,
    EXPECTED_BODY_KEY,
    METRICS_LISTENER_KEY,
    METRICS_TOKEN_KEY,
    AWS_REGION_KEY,
    AWS_LAMBDA_FUNCTION_NAME_KEY,
];

const AWS_REGION_LABEL: &str = "aws_region";
const AWS_LAMBDA_FUNCTION_LABEL: &str = "aws_lambda_function";

/// HTTP methods the probe is allowed to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            _ => None,
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Credentials attached to the probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

/// Where the probe outcome is pushed to.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Remote write endpoint, used as-is for the push request.
    pub endpoint: String,

    /// Sent as a bearer token on the push request.
    pub token: String,

    /// Labels describing the environment the probe runs in.
    /// Attached to every series by the sink.
    pub external_labels: Vec<(String, String)>,
}

/// The validated settings of a single probe run.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub url: Url,
    pub method: Method,

    /// Extra request headers. A `Host` entry overrides the host sent on the wire.
    pub headers: HeaderMap,

    /// Request body. Not attached when empty.
    pub body: String,

    /// Upper bound for the whole exchange, headers and body included.
    pub response_timeout: Duration,

    pub auth: Auth,
    pub expected_status_code: u16,

    /// Compared byte for byte against the response body.
    pub expected_body: String,

    pub sink: SinkConfig,
}

impl ProbeConfig {
    /// Builds and validates a configuration from a key lookup.
    ///
    /// Missing and empty values are treated alike. The first failing rule
    /// is returned; nothing is probed with a partially valid configuration.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).unwrap_or_default();

        let endpoint = required(&lookup, METRICS_LISTENER_KEY)?;
        let token = required(&lookup, METRICS_TOKEN_KEY)?;

        let raw_url = required(&lookup, API_URL_KEY)?;
        let url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(raw_url));
        }

        let method = Method::parse(&value(METHOD_KEY)).ok_or(ConfigError::InvalidMethod(METHOD_KEY))?;

        let headers = parse_headers(&value(HEADERS_KEY))?;

        let timeout_seconds: i64 = value(API_RESPONSE_TIMEOUT_KEY)
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber(API_RESPONSE_TIMEOUT_KEY))?;
        if timeout_seconds < 1 {
            return Err(ConfigError::NotPositive(API_RESPONSE_TIMEOUT_KEY));
        }

        let expected_status_code: i64 = value(EXPECTED_STATUS_CODE_KEY)
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber(EXPECTED_STATUS_CODE_KEY))?;
        if !(100..=599).contains(&expected_status_code) {
            return Err(ConfigError::StatusCodeOutOfRange(EXPECTED_STATUS_CODE_KEY));
        }

        let auth = parse_auth(
            &value(BEARER_TOKEN_KEY),
            value(USERNAME_KEY),
            value(PASSWORD_KEY),
        )?;

        let external_labels = [
            (AWS_REGION_LABEL, value(AWS_REGION_KEY)),
            (AWS_LAMBDA_FUNCTION_LABEL, value(AWS_LAMBDA_FUNCTION_NAME_KEY)),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Ok(ProbeConfig {
            url,
            method,
            headers,
            body: value(BODY_KEY),
            response_timeout: Duration::from_secs(timeout_seconds as u64),
            auth,
            expected_status_code: expected_status_code as u16,
            expected_body: value(EXPECTED_BODY_KEY),
            sink: SinkConfig {
                endpoint,
                token,
                external_labels,
            },
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_auth(bearer_token: &str, username: String, password: String) -> Result<Auth, ConfigError> {
    let bearer_token = bearer_token.trim_matches('\n');
    let has_basic = !username.is_empty() || !password.is_empty();

    match (bearer_token.is_empty(), has_basic) {
        (false, true) => Err(ConfigError::ConflictingAuth),
        (false, false) => Ok(Auth::Bearer(bearer_token.to_string())),
        (true, true) => Ok(Auth::Basic { username, password }),
        (true, false) => Ok(Auth::None),
    }
}

/// Parses `key=value` pairs separated by commas.
///
/// Keys and values are trimmed and the value is everything after the first `=`.
/// A repeated key keeps its last value.
pub fn parse_headers(raw: &str) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    if raw.is_empty() {
        return Ok(headers);
    }

    for entry in raw.split(',') {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(ConfigError::MalformedHeader(entry.to_string()));
        };

        let name = HeaderName::from_bytes(key.trim().as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(entry.to_string()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| ConfigError::InvalidHeader(entry.to_string()))?;

        log::debug!("Got API HTTP request header: {} = {:?}", name, value);
        headers.insert(name, value);
    }

    Ok(headers)
}
