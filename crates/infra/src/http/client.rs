use std::collections::BTreeMap;
use std::time::Duration;

use apiseed_domain::{ClientSettings, SeedError};
use reqwest::Client as ReqwestClient;
use tracing::{debug, trace, warn};

use super::request::{
    JsonRequest, JsonResponse, ProbeRequest, ProbeResponse, RedactedRequest, RequestDiagnostics,
};
use super::url::{clean_string, sanitize_url};
use crate::errors::InfraError;

const DEFAULT_HEADERS: [(&str, &str); 2] =
    [("Accept", "application/json"), ("Content-Type", "application/json")];

/// JSON-over-HTTP transport.
///
/// Classifies responses: 5xx is an error, 4xx and unparsable bodies are
/// reported in-band through [`JsonResponse::error`].
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, SeedError> {
        Self::builder().build()
    }

    /// Client configured from the loaded client settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, SeedError> {
        Self::builder()
            .timeout(settings.request_timeout)
            .accept_invalid_certs(settings.accept_invalid_certs)
            .build()
    }

    /// Default per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a JSON request and classify the answer.
    ///
    /// # Errors
    /// - `SeedError::Network` when no response was received
    /// - `SeedError::Server` for any 5xx status
    pub async fn send_json(&self, request: JsonRequest) -> Result<JsonResponse, SeedError> {
        let url = sanitize_url(&request.url);
        let method = request.method.clone();
        debug!(%method, url = %url, "Sending JSON request to {url}");

        let headers = merge_headers(&request.headers);
        let timeout = request.timeout.unwrap_or(self.timeout);
        let data = request.encoded_body();
        let redacted = RedactedRequest::new(&url, &method, &headers, data.clone(), timeout);

        let mut builder = self.client.request(method.clone(), &url).timeout(timeout);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(data) = data {
            builder = builder.body(data);
        }

        let response = builder.send().await.map_err(|err| request_failed(err, &redacted))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| request_failed(err, &redacted))?;
        trace!(%method, url = %url, status, body = %text, "Received JSON response");

        let diagnostics = RequestDiagnostics {
            request: redacted,
            response: (!text.is_empty()).then(|| clean_string(&text)),
            msg: None,
        };

        if status >= 500 {
            return Err(SeedError::Server(format!("HTTP {status}: {diagnostics}")));
        }

        let mut result = JsonResponse { status, ..JsonResponse::default() };
        if status >= 400 {
            result.error = Some(diagnostics.clone());
        }

        if !text.is_empty() {
            match serde_json::from_str(&text) {
                Ok(json) => result.json_body = Some(json),
                Err(err) => {
                    let msg = format!("Server responded with non-JSON body for {}.", request.url);
                    warn!(status, "{msg}");
                    result.error = Some(diagnostics.with_msg(format!("{msg} {err}")));
                }
            }
            result.body = Some(text);
        }

        Ok(result)
    }

    /// Send a request without classifying the status.
    ///
    /// Any HTTP answer is `Ok`; only transport failures are errors.
    pub async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, SeedError> {
        let url = sanitize_url(&request.url);
        let method = request.method;
        debug!(%method, url = %url, "Sending request");

        let response = self
            .client
            .request(method.clone(), &url)
            .timeout(request.timeout.unwrap_or(self.timeout))
            .send()
            .await
            .map_err(|err| SeedError::from(InfraError::from(err)))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        trace!(%method, url = %url, status, body = %body, "Received response");

        Ok(ProbeResponse { status, body })
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    accept_invalid_certs: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: ClientSettings::default().request_timeout,
            user_agent: Some(concat!("apiseed/", env!("CARGO_PKG_VERSION")).to_string()),
            accept_invalid_certs: false,
        }
    }
}

impl HttpClientBuilder {
    /// Default timeout applied to requests that do not carry their own.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Skip TLS certificate verification (self-signed lab clusters).
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    pub fn build(self) -> Result<HttpClient, SeedError> {
        let mut builder = ReqwestClient::builder().no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| SeedError::from(InfraError::from(err)))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}

/// JSON defaults overlaid with caller headers (names compared
/// case-insensitively).
fn merge_headers(custom: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = DEFAULT_HEADERS
        .iter()
        .filter(|(name, _)| !custom.keys().any(|key| key.eq_ignore_ascii_case(name)))
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect();
    headers.extend(custom.iter().map(|(name, value)| (name.clone(), value.clone())));
    headers
}

fn request_failed(err: reqwest::Error, request: &RedactedRequest) -> SeedError {
    let request_json = serde_json::to_string(request).unwrap_or_else(|_| request.url.clone());
    match SeedError::from(InfraError::from(err)) {
        SeedError::Network(msg) => {
            SeedError::Network(format!("Request failed: {msg}; request: {request_json}"))
        }
        other => other,
    }
}
