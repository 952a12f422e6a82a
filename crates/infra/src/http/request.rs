//! Request and response envelopes for the JSON transport

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use apiseed_domain::constants::{DEFAULT_METHOD, REDACTED_AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// A JSON request.
///
/// A `body` holding a JSON string is sent verbatim; any other value is
/// serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl JsonRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wire form of the body.
    pub(crate) fn encoded_body(&self) -> Option<String> {
        self.body.as_ref().map(|body| match body {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        })
    }
}

/// Outcome of a request that reached the server and got a non-5xx answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RequestDiagnostics>,
}

impl JsonResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Request as it appears in diagnostics: Authorization is never shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactedRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub timeout: u64,
}

impl RedactedRequest {
    pub(crate) fn new(
        url: &str,
        method: &Method,
        headers: &BTreeMap<String, String>,
        data: Option<String>,
        timeout: Duration,
    ) -> Self {
        let mut headers = headers.clone();
        headers.retain(|name, _| !name.eq_ignore_ascii_case("authorization"));
        headers.insert("Authorization".to_string(), REDACTED_AUTHORIZATION.to_string());

        Self {
            url: url.to_string(),
            method: method.as_str().to_string(),
            headers,
            data,
            timeout: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Request/response pair attached to failed requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDiagnostics {
    pub request: RedactedRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl RequestDiagnostics {
    #[must_use]
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }
}

impl fmt::Display for RequestDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{} {}", self.request.method, self.request.url),
        }
    }
}

/// Unclassified request, used for reachability checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub method: Method,
    pub timeout: Option<Duration>,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: Method::GET, timeout: None }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Any HTTP answer to a [`ProbeRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

pub(crate) fn default_method() -> Method {
    Method::from_bytes(DEFAULT_METHOD.as_bytes()).unwrap_or(Method::GET)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_bodies_are_sent_verbatim() {
        let raw = JsonRequest::new("https://h").body(Value::String("{\"a\":1}".into()));
        assert_eq!(raw.encoded_body().as_deref(), Some("{\"a\":1}"));

        let structured = JsonRequest::new("https://h").body(json!({"name": "org"}));
        assert_eq!(structured.encoded_body().as_deref(), Some(r#"{"name":"org"}"#));

        assert_eq!(JsonRequest::new("https://h").encoded_body(), None);
    }

    #[test]
    fn diagnostics_hide_authorization() {
        let headers = BTreeMap::from([
            ("authorization".to_string(), "Bearer secret".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]);
        let request = RedactedRequest::new(
            "https://h/api/me",
            &Method::POST,
            &headers,
            None,
            Duration::from_secs(180),
        );
        let diagnostics = RequestDiagnostics { request, response: Some("{}".into()), msg: None };

        let rendered = diagnostics.to_string();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains(REDACTED_AUTHORIZATION));
        assert!(rendered.contains("\"timeout\":180000"));
    }
}
