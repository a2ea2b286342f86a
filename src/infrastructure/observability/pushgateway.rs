//! Prometheus Pushgateway client
//!
//! One `PUT {endpoint}/metrics/job/{job}` per run, replacing whatever the
//! group held before. The request is bounded by the configured timeout and
//! is never retried.

use crate::config::RunConfiguration;
use crate::domain::errors::FlushError;
use crate::domain::ports::MetricsPusher;
use crate::domain::registry::RunRegistry;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct PushgatewayClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl PushgatewayClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, FlushError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlushError::Transport {
                url: endpoint.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn from_config(config: &RunConfiguration) -> Result<Self, FlushError> {
        Self::new(config.endpoint_url.clone(), config.push_timeout)
    }

    /// Grouping URL for `job` under the configured endpoint
    pub fn push_url(&self, job: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["metrics", "job", job]);
        }
        url
    }

    fn transport_error(&self, url: &Url, error: reqwest::Error) -> FlushError {
        if error.is_timeout() {
            FlushError::Timeout {
                url: url.to_string(),
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else {
            FlushError::Transport {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl MetricsPusher for PushgatewayClient {
    async fn push(&self, job: &str, registry: &RunRegistry) -> Result<(), FlushError> {
        let url = self.push_url(job);
        let body = registry.encode()?;
        debug!("PUT {} ({} series, {} bytes)", url, registry.len(), body.len());

        let response = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, RunRegistry::content_type())
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FlushError::Rejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        debug!("Pushgateway accepted push with status {}", status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> PushgatewayClient {
        PushgatewayClient::new(Url::parse(endpoint).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_push_url_from_root() {
        let url = client("http://localhost:9091").push_url("nightly");
        assert_eq!(url.as_str(), "http://localhost:9091/metrics/job/nightly");
    }

    #[test]
    fn test_push_url_keeps_base_path() {
        let url = client("http://gateway.example.com/prom/").push_url("ci");
        assert_eq!(url.as_str(), "http://gateway.example.com/prom/metrics/job/ci");
    }

    #[test]
    fn test_push_url_escapes_job() {
        let url = client("http://localhost:9091").push_url("my job");
        assert_eq!(url.as_str(), "http://localhost:9091/metrics/job/my%20job");
    }
}
