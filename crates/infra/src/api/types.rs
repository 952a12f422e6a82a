//! Request options, flags and the uniform result envelope

use std::collections::BTreeMap;
use std::time::Duration;

use apiseed_domain::{ErrorCategory, SeedError};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::http::request::default_method;
use crate::http::RequestDiagnostics;

/// Per-call request options.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { method: default_method(), body: None, headers: BTreeMap::new(), timeout: None }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn maybe_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
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
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Behavior switches for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFlags {
    /// Send without a bearer token (and without requiring one).
    pub skip_auth: bool,
    /// Report failed requests through the error log (or fail in strict mode).
    pub log_errors: bool,
}

impl Default for RequestFlags {
    fn default() -> Self {
        Self { skip_auth: false, log_errors: true }
    }
}

impl RequestFlags {
    pub fn skip_auth() -> Self {
        Self { skip_auth: true, ..Self::default() }
    }

    #[must_use]
    pub fn log_errors(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }
}

/// What every façade call returns.
///
/// Exactly one of three shapes: a clean answer (`status` and maybe `body`),
/// an application error (`status` and `error`), or retry exhaustion
/// (`retry_errors` only).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RequestDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_errors: Option<Vec<SeedError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl RequestResult {
    /// `false` on an application error or after retry exhaustion.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.retry_errors.is_none()
    }

    /// Parsed body when no application error was reported.
    pub fn into_body(self) -> Option<Value> {
        if self.error.is_some() {
            return None;
        }
        self.body
    }

    /// Category of the failure: the last attempt's error after exhaustion,
    /// `Application` for an in-band error, `None` on success.
    pub fn failure_category(&self) -> Option<ErrorCategory> {
        match (&self.retry_errors, &self.error) {
            (Some(errors), _) => errors.last().map(SeedError::category),
            (None, Some(_)) => Some(ErrorCategory::Application),
            (None, None) => None,
        }
    }

    /// Compact JSON with the failure details, for logs.
    pub fn failure_summary(&self) -> String {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Failure<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            retry_errors: Option<&'a Vec<SeedError>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a RequestDiagnostics>,
        }

        let failure =
            Failure { retry_errors: self.retry_errors.as_ref(), error: self.error.as_ref() };
        serde_json::to_string(&failure).unwrap_or_else(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_flags_require_auth_and_log_errors() {
        let flags = RequestFlags::default();
        assert!(!flags.skip_auth);
        assert!(flags.log_errors);

        let flags = RequestFlags::skip_auth().log_errors(false);
        assert!(flags.skip_auth);
        assert!(!flags.log_errors);
    }

    #[test]
    fn default_options_use_get() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());
    }

    #[test]
    fn exhausted_result_has_no_body_and_summarizes_errors() {
        let result = RequestResult {
            retry_errors: Some(vec![SeedError::Server("HTTP 502".into())]),
            ..RequestResult::default()
        };

        assert!(!result.is_success());
        let summary: Value = serde_json::from_str(&result.failure_summary()).unwrap();
        assert_eq!(summary["retryErrors"][0]["type"], "Server");
        assert_eq!(result.failure_category(), Some(ErrorCategory::Transport));
        assert!(result.into_body().is_none());
    }

    #[test]
    fn clean_result_yields_body() {
        let result = RequestResult {
            body: Some(json!({"id": 1})),
            status: Some(200),
            ..RequestResult::default()
        };
        assert!(result.is_success());
        assert_eq!(result.failure_category(), None);
        assert_eq!(result.into_body(), Some(json!({"id": 1})));
    }
}
