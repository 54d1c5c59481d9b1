use reqwest::{Client, Request};

use crate::config::probe_config::{Auth, ProbeConfig};

/// Creates the outbound probe request described by the configuration.
/// Nothing is sent; the request is only assembled against `client`.
pub fn build_request(client: &Client, config: &ProbeConfig) -> reqwest::Result<Request> {
    log::debug!("Creating API HTTP request...");

    let mut builder = client
        .request(config.method.into(), config.url.clone())
        .headers(config.headers.clone());

    if !config.body.is_empty() {
        builder = builder.body(config.body.clone());
    }

    builder = match &config.auth {
        Auth::None => builder,
        Auth::Bearer(token) => builder.bearer_auth(token),
        Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
    };

    builder.build()
}
