//! Shared fixtures for the infra integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use apiseed_common::SessionStore;
use apiseed_domain::{
    option_names, AuthSettings, ClientSettings, HostKind, HostSource, OptionsProvider,
    SharedOptions,
};
use apiseed_infra::{ApiClients, AuthClient, HostResolver, HttpClient};
use wiremock::MockServer;

/// Client settings with short pauses so retry tests stay fast.
pub fn test_settings() -> ClientSettings {
    ClientSettings {
        request_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(2),
        retry_pause: Duration::from_millis(10),
        ..ClientSettings::default()
    }
}

/// Options pointing the three app hosts at `server`, bypassing probes.
pub fn host_options(server: &MockServer) -> SharedOptions {
    let options = SharedOptions::new();
    options.set(option_names::USE_HOST_OPTIONS, true.into());
    for kind in [HostKind::Admin, HostKind::Manager, HostKind::Consumer] {
        options.set(kind.as_str(), server.uri().into());
    }
    options
}

/// Façade wired to `server` through per-kind host overrides.
pub fn api_clients(server: &MockServer) -> ApiClients {
    clients_with_source(host_options(server), HostSource::default())
}

/// Façade resolving hosts from `source` with real HTTP probes.
pub fn clients_with_source(options: SharedOptions, source: HostSource) -> ApiClients {
    let settings = test_settings();
    let options: Arc<dyn OptionsProvider> = Arc::new(options);
    let http = HttpClient::from_settings(&settings).expect("HTTP client should build");
    let resolver = Arc::new(HostResolver::with_http_probe(
        options.clone(),
        source,
        settings.clone(),
        http.clone(),
    ));
    ApiClients::new(http, resolver, SessionStore::new(), options, settings)
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        client_id: "provider-client".into(),
        client_secret: "provider-secret".into(),
        consumer_client_id: "consumer-client".into(),
        consumer_client_secret: "consumer-secret".into(),
    }
}

pub fn auth_client(api: &ApiClients) -> AuthClient {
    AuthClient::new(api.clone(), auth_settings())
}
