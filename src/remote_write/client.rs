use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use prost::Message;
use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use snap::raw::Encoder;

use super::SinkError;
use super::prompb::{Label, Sample, TimeSeries, WriteRequest};
use crate::config::probe_config::SinkConfig;
use crate::metrics::MetricRecord;

const NAME_LABEL: &str = "__name__";
const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends metric records to a Prometheus remote write endpoint in a single request.
///
/// # Arguments
///
/// * `sink` - Endpoint, bearer token and the environment labels to attach to every series.
/// * `records` - The records of one run.
pub async fn send_metrics(sink: &SinkConfig, records: &[MetricRecord]) -> Result<(), SinkError> {
    if records.is_empty() {
        log::warn!("No metrics to send.");
        return Ok(());
    }

    let timestamp_ms = Utc::now().timestamp_millis();
    let timeseries = records
        .iter()
        .map(|record| create_time_series(record, &sink.external_labels, timestamp_ms))
        .collect();

    let compressed_data = encode_write_request(timeseries)?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_ENCODING, HeaderValue::from_static("snappy"));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-protobuf"),
    );
    headers.insert(
        "x-prometheus-remote-write-version",
        HeaderValue::from_static("0.1.0"),
    );
    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", sink.token))?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);

    log::debug!("Sending {} series to {}", records.len(), sink.endpoint);

    let client = Client::builder().timeout(REMOTE_TIMEOUT).build()?;
    let response = client
        .post(&sink.endpoint)
        .headers(headers)
        .body(compressed_data)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        log::error!("Failed to push metrics: {} - {}", status, body);
        return Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}

/// Serializes the series as a `WriteRequest` and compresses it with raw snappy.
pub fn encode_write_request(timeseries: Vec<TimeSeries>) -> Result<Vec<u8>, SinkError> {
    let write_request = WriteRequest { timeseries };
    let buf = write_request.encode_to_vec();

    let mut encoder = Encoder::new();
    Ok(encoder.compress_vec(&buf)?)
}

/// Creates a `TimeSeries` with a single sample for the given record.
///
/// External labels are added unless the record already carries a label with that name.
/// Labels come out sorted by name, as remote write receivers expect.
pub fn create_time_series(
    record: &MetricRecord,
    external_labels: &[(String, String)],
    timestamp_ms: i64,
) -> TimeSeries {
    let mut labels: BTreeMap<&str, &str> = record
        .labels
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    for (name, value) in external_labels {
        labels.entry(name.as_str()).or_insert(value.as_str());
    }
    labels.insert(NAME_LABEL, record.name.as_str());

    TimeSeries {
        labels: labels
            .into_iter()
            .map(|(name, value)| Label {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect(),
        samples: vec![Sample {
            value: record.value,
            timestamp: timestamp_ms,
        }],
    }
}


#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test::{decode_write_request, labels_of};
    use super::*;

    fn record(name: &str, value: f64, labels: &[(&str, &str)]) -> MetricRecord {
        MetricRecord {
            name: name.to_string(),
            value,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn sink(endpoint: String) -> SinkConfig {
        SinkConfig {
            endpoint,
            token: "123456789a".to_string(),
            external_labels: vec![
                ("aws_region".to_string(), "us-east-1".to_string()),
                ("aws_lambda_function".to_string(), "test".to_string()),
            ],
        }
    }

    #[test]
    fn test_create_time_series() {
        let record = record(
            "api_status_status",
            1.0,
            &[("url", "https://example.api/"), ("status", "success"), ("aws_region", "eu-west-1")],
        );
        let external = vec![
            ("aws_region".to_string(), "us-east-1".to_string()),
            ("aws_lambda_function".to_string(), "test".to_string()),
        ];

        let series = create_time_series(&record, &external, 1_700_000_000_000);

        let names: Vec<&str> = series.labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["__name__", "aws_lambda_function", "aws_region", "status", "url"]
        );
        let labels = labels_of(&series);
        assert_eq!(labels["__name__"], "api_status_status");
        assert_eq!(labels["aws_region"], "eu-west-1");
        assert_eq!(labels["aws_lambda_function"], "test");
        assert_eq!(
            series.samples,
            vec![Sample {
                value: 1.0,
                timestamp: 1_700_000_000_000
            }]
        );
    }

    #[test]
    fn test_encode_write_request() {
        let series = create_time_series(&record("api_status_response_time", 12.5, &[]), &[], 1);
        let encoded = encode_write_request(vec![series.clone()]).expect("encoded");

        let decoded = decode_write_request(&encoded);
        assert_eq!(decoded.timeseries, vec![series]);
    }

    #[tokio::test]
    async fn test_send_metrics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/push"))
            .and(header("content-encoding", "snappy"))
            .and(header("content-type", "application/x-protobuf"))
            .and(header("x-prometheus-remote-write-version", "0.1.0"))
            .and(header("authorization", "Bearer 123456789a"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let records = vec![
            record("api_status_response_time", 12.5, &[("unit", "milliseconds")]),
            record("api_status_status", 1.0, &[("status", "success")]),
        ];
        send_metrics(&sink(format!("{}/api/v1/push", server.uri())), &records)
            .await
            .expect("metrics accepted");

        let requests = server.received_requests().await.expect("recorded requests");
        let write_request = decode_write_request(&requests[0].body);
        assert_eq!(write_request.timeseries.len(), 2);
        for series in &write_request.timeseries {
            let labels = labels_of(series);
            assert_eq!(labels["aws_region"], "us-east-1");
            assert_eq!(labels["aws_lambda_function"], "test");
        }
    }

    #[tokio::test]
    async fn test_rejected_push_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .expect(1)
            .mount(&server)
            .await;

        let records = vec![record("api_status_status", 1.0, &[])];
        let result = send_metrics(&sink(server.uri()), &records).await;

        match result {
            Err(SinkError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        send_metrics(&sink(server.uri()), &[])
            .await
            .expect("nothing to send");
    }
}
