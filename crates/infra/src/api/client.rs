//! Authenticated request façade
//!
//! Every call resolves the role's host, attaches the stored bearer token and
//! runs the JSON transport inside the fixed-pause retry engine. A consumer
//! context stored at sign-in rides along as `X-IBM-Consumer-Context` unless
//! the caller sets that header. Results come back as a [`RequestResult`];
//! the `send_*` shorthands reduce that to the parsed body.
//!
//! `retries` counts attempts after the first one. `None` falls back to the
//! `retries` option and then to the configured default, while `Some(0)`
//! sends exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;

use apiseed_common::resilience::{retry, RetryConfig, RetryOutcome};
use apiseed_common::SessionStore;
use apiseed_domain::constants::CONSUMER_CONTEXT_HEADER;
use apiseed_domain::{
    option_names, AppRole, ClientSettings, Config, HostSource, OptionsProvider, Result, SeedError,
    SharedOptions,
};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};

use super::report::report_error;
use super::types::{RequestFlags, RequestOptions, RequestResult};
use crate::hosts::HostResolver;
use crate::http::{HttpClient, JsonRequest};

/// Entry point for role-scoped API calls.
///
/// Cloning shares the transport, the host cache and the session store.
#[derive(Clone)]
pub struct ApiClients {
    http: HttpClient,
    resolver: Arc<HostResolver>,
    store: SessionStore,
    options: Arc<dyn OptionsProvider>,
    settings: ClientSettings,
}

impl ApiClients {
    pub fn new(
        http: HttpClient,
        resolver: Arc<HostResolver>,
        store: SessionStore,
        options: Arc<dyn OptionsProvider>,
        settings: ClientSettings,
    ) -> Self {
        Self { http, resolver, store, options, settings }
    }

    /// Wire up transport, HTTP probe resolver and an empty session store from
    /// loaded configuration.
    ///
    /// # Errors
    /// Returns `SeedError::Network`/`InvalidInput` if the HTTP client cannot
    /// be built.
    pub fn from_config(config: &Config, source: HostSource) -> Result<Self> {
        let options: Arc<dyn OptionsProvider> =
            Arc::new(SharedOptions::from_options(&config.options));
        let http = HttpClient::from_settings(&config.client)?;
        let resolver = Arc::new(HostResolver::with_http_probe(
            options.clone(),
            source,
            config.client.clone(),
            http.clone(),
        ));

        Ok(Self::new(http, resolver, SessionStore::new(), options, config.client.clone()))
    }

    pub fn resolver(&self) -> &HostResolver {
        &self.resolver
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    pub fn options(&self) -> &dyn OptionsProvider {
        self.options.as_ref()
    }

    /// Call an admin endpoint; `None` when the request failed.
    ///
    /// `retries: Some(0)` disables retrying; pass `None` for the default.
    pub async fn send_admin(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        headers: Option<BTreeMap<String, String>>,
        retries: Option<u32>,
    ) -> Result<Option<Value>> {
        let options =
            RequestOptions::new(method).maybe_body(body).headers(headers.unwrap_or_default());
        let flags = RequestFlags::default();
        let result = self.send_request(AppRole::Admin, endpoint, options, flags, retries).await?;
        Ok(result.into_body())
    }

    /// Call a manager endpoint; `None` when the request failed.
    ///
    /// `retries: Some(0)` disables retrying; pass `None` for the default.
    pub async fn send_manager(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        headers: Option<BTreeMap<String, String>>,
        retries: Option<u32>,
        log_errors: bool,
    ) -> Result<Option<Value>> {
        let options =
            RequestOptions::new(method).maybe_body(body).headers(headers.unwrap_or_default());
        let flags = RequestFlags::default().log_errors(log_errors);
        let result = self.send_request(AppRole::Manager, endpoint, options, flags, retries).await?;
        Ok(result.into_body())
    }

    /// Call a consumer endpoint in the context of `provider_org.catalog`;
    /// `None` when the request failed.
    ///
    /// `retries: Some(0)` disables retrying; pass `None` for the default.
    ///
    /// # Errors
    /// Returns `SeedError::InvalidInput` when `provider_org` or `catalog` is
    /// empty.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_consumer(
        &self,
        endpoint: &str,
        method: Method,
        provider_org: &str,
        catalog: &str,
        body: Option<Value>,
        headers: Option<BTreeMap<String, String>>,
        retries: Option<u32>,
    ) -> Result<Option<Value>> {
        let context = consumer_context(provider_org, catalog)?;
        let options = RequestOptions::new(method)
            .maybe_body(body)
            .headers(headers.unwrap_or_default())
            .header(CONSUMER_CONTEXT_HEADER, context);
        let flags = RequestFlags::default();
        let result = self.send_request(AppRole::Consumer, endpoint, options, flags, retries).await?;
        Ok(result.into_body())
    }

    /// Send `options` to `endpoint` on the host of `role`.
    ///
    /// # Errors
    /// - host resolution failures
    /// - `SeedError::Config` when no token is stored and `skip_auth` is off
    /// - `SeedError::Request` for a failed request in strict mode
    #[instrument(skip(self, options), fields(role = %role, method = %options.method))]
    pub async fn send_request(
        &self,
        role: AppRole,
        endpoint: &str,
        options: RequestOptions,
        flags: RequestFlags,
        retries: Option<u32>,
    ) -> Result<RequestResult> {
        if endpoint.is_empty() {
            return Err(SeedError::InvalidInput("endpoint is required".into()));
        }
        let host = self.resolver.host(role.into()).await?;
        if host.is_empty() {
            return Err(SeedError::Config(format!("API host cannot be resolved for {role} app")));
        }

        self.dispatch(role, format!("{host}{endpoint}"), options, flags, retries).await
    }

    /// Send a request to an absolute `url` with the token of `role`.
    ///
    /// # Errors
    /// Same as [`ApiClients::send_request`], minus host resolution.
    #[instrument(skip(self), fields(role = %role))]
    pub async fn send_to_url(
        &self,
        url: &str,
        method: Method,
        role: AppRole,
        flags: RequestFlags,
        retries: Option<u32>,
    ) -> Result<RequestResult> {
        if url.is_empty() {
            return Err(SeedError::InvalidInput("url is required".into()));
        }
        self.dispatch(role, url.to_string(), RequestOptions::new(method), flags, retries).await
    }

    async fn dispatch(
        &self,
        role: AppRole,
        url: String,
        options: RequestOptions,
        flags: RequestFlags,
        retries: Option<u32>,
    ) -> Result<RequestResult> {
        let mut headers = BTreeMap::new();
        if !flags.skip_auth {
            let token = self.store.get(&role.token_key()).ok_or_else(|| {
                SeedError::Config(format!(
                    "You must sign in before making an API request to {role} app or use flag \
                     \"skipAuth\" to send request without signing in"
                ))
            })?;
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        if let Some(context) = self.store.get(&role.context_key()) {
            headers.insert(CONSUMER_CONTEXT_HEADER.to_string(), context);
        }
        headers.extend(options.headers);

        let request = JsonRequest {
            url,
            method: options.method,
            headers,
            body: options.body,
            timeout: options.timeout,
        };
        let config = self.retry_config(retries);
        debug!(url = %request.url, max_retries = config.max_retries, "Dispatching request");

        let result = match retry(&config, || self.http.send_json(request.clone())).await {
            RetryOutcome::Success(response) => RequestResult {
                body: response.json_body,
                error: response.error,
                retry_errors: None,
                status: Some(response.status),
            },
            RetryOutcome::Exhausted { retry_errors } => {
                RequestResult { retry_errors: Some(retry_errors), ..RequestResult::default() }
            }
        };

        if let Some(category) = result.failure_category().filter(|_| flags.log_errors) {
            report_error(
                self.options.as_ref(),
                format!("{category} request failure: {}", result.failure_summary()),
            )?;
        }

        Ok(result)
    }

    /// Caller's count, else the `retries` option (a non-positive value means
    /// the configured default). An explicit `Some(0)` is kept as zero.
    fn retry_config(&self, retries: Option<u32>) -> RetryConfig {
        let default_retries = self
            .options
            .number(option_names::RETRIES)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.settings.default_retries);

        RetryConfig::builder()
            .max_retries(retries.unwrap_or(default_retries))
            .pause(self.settings.retry_pause)
            .silent(self.options.flag(option_names::SILENT_RETRY))
            .build()
    }
}

/// `X-IBM-Consumer-Context` value for a provider org and catalog.
pub(crate) fn consumer_context(provider_org: &str, catalog: &str) -> Result<String> {
    if provider_org.is_empty() || catalog.is_empty() {
        return Err(SeedError::InvalidInput(
            "providerOrg and catalog are required for consumer requests".into(),
        ));
    }
    Ok(format!("{provider_org}.{catalog}"))
}
