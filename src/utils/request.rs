use std::time::Duration;

use reqwest::{Client, Method, header::HeaderMap};
use serde::Deserialize;
use tracing::debug;

use crate::errors::DnsError;

/// Transport used by the AliDNS client to send signed requests.
pub trait DnsHttpClient: Send + Sync {
    /// Sends the request and returns the decoded JSON body.
    ///
    /// Non-success HTTP statuses are returned as errors.
    fn request(
        &self,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<String>,
    ) -> impl Future<Output = Result<serde_json::Value, DnsError>> + Send;
}

pub struct DefaultDnsClient {
    inner: Client,
}

impl DefaultDnsClient {
    pub fn new() -> Self {
        Self {
            inner: Client::new(),
        }
    }

    /// Builds a client whose requests are bounded by `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, DnsError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder
            .build()
            .map_err(|e| DnsError::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { inner })
    }
}

impl Default for DefaultDnsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Error body returned by the RPC API alongside a non-2xx status.
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "RequestId", default)]
    request_id: String,
}

impl DnsHttpClient for DefaultDnsClient {
    async fn request(
        &self,
        method: Method,
        url: String,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<serde_json::Value, DnsError> {
        let mut req = self.inner.request(method, url).headers(headers);
        if let Some(body) = body {
            req = req.body(body);
        }
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!("AliDNS API returned status {}", status);
            return match serde_json::from_str::<ErrorBody>(&text) {
                Ok(err) if !err.code.is_empty() => Err(DnsError::Api {
                    code: err.code,
                    message: err.message,
                    request_id: err.request_id,
                }),
                _ => Err(DnsError::UnexpectedResponse(format!(
                    "status {}: {}",
                    status, text
                ))),
            };
        }

        let json_value: serde_json::Value = serde_json::from_str(&text)?;

        Ok(json_value)
    }
}
