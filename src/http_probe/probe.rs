use std::time::{Duration, Instant};

use reqwest::{Client, Request};

use super::report;
use super::result::Exchange;

const USER_AGENT: &str = "api-status-probe/1.0";

/// Client used for the probe itself. `timeout` bounds the whole exchange, body included.
pub fn probe_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Performs the single HTTP exchange of a run. Never retries.
///
/// The elapsed time covers dispatch until status and headers are available;
/// reading the body is not part of it.
pub async fn execute(client: &Client, request: Request) -> Exchange {
    log::debug!("Getting API HTTP response from {} {}", request.method(), request.url());

    let start = Instant::now();
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return Exchange::TimedOut,
        Err(e) => {
            return Exchange::ConnectFailed {
                error: report(&e),
            };
        }
    };
    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    let body = response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| report(&e));

    Exchange::Responded {
        status,
        elapsed,
        body,
    }
}


#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test::{closed_port, truncated_body_server};
    use super::*;

    async fn get(client: &Client, url: &str) -> Exchange {
        let request = client.get(url).build().expect("request");
        execute(client, request).await
    }

    #[tokio::test]
    async fn test_responded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("success"))
            .expect(1)
            .mount(&server)
            .await;

        let client = probe_client(Duration::from_secs(5)).expect("client");
        let exchange = get(&client, &format!("{}/health", server.uri())).await;

        match exchange {
            Exchange::Responded { status, body, .. } => {
                assert_eq!(status, 200);
                assert_eq!(body.expect("body"), b"success");
            }
            other => panic!("unexpected exchange {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timed_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = probe_client(Duration::from_millis(200)).expect("client");
        let exchange = get(&client, &server.uri()).await;

        assert_eq!(exchange, Exchange::TimedOut);
    }

    #[tokio::test]
    async fn test_connect_failed() {
        let addr = closed_port().await;

        let client = probe_client(Duration::from_secs(5)).expect("client");
        let exchange = get(&client, &format!("http://{addr}/")).await;

        match exchange {
            Exchange::ConnectFailed { error } => assert!(!error.is_empty()),
            other => panic!("unexpected exchange {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let addr = truncated_body_server().await;

        let client = probe_client(Duration::from_secs(5)).expect("client");
        let exchange = get(&client, &format!("http://{addr}/")).await;

        match exchange {
            Exchange::Responded { status, body, .. } => {
                assert_eq!(status, 200);
                assert!(body.is_err());
            }
            other => panic!("unexpected exchange {other:?}"),
        }
    }
}
