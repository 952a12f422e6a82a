//! Configuration management
//!
//! Two layers live here:
//! - [`SeedOptions`]: the typed option set loaded from CLI flags, environment
//!   and config files.
//! - [`OptionsProvider`]: the name-keyed accessor the core reads at call time
//!   (`get(name)` / `set(name, value)`), implemented by [`SharedOptions`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CLUSTER_DOMAIN, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_RETRIES, DEFAULT_RETRY_PAUSE_MS,
    DEFAULT_TIMEOUT_MS, LAB_DOMAIN_SUFFIX, PROBE_TIMEOUT_MS,
};
use crate::types::HostKind;

// ============================================================================
// Option names
// ============================================================================

/// Names understood by [`OptionsProvider`].
pub mod option_names {
    pub const CONFIG: &str = "config";
    pub const DEBUG: &str = "debug";
    pub const STRICT: &str = "strict";
    pub const LOG_TO_FILE: &str = "logToFile";
    pub const ORG: &str = "org";
    pub const SILENT_RETRY: &str = "silentRetry";
    pub const SILENT: &str = "silent";
    pub const RETRIES: &str = "retries";
    pub const NO_TS: &str = "noTs";
    pub const USE_API_HOST: &str = "useAPIHost";
    pub const VERBOSE: &str = "verbose";
    pub const HTTP: &str = "http";
    pub const USE_HOST_OPTIONS: &str = "useHostOptions";
    pub const BASE_HOST: &str = "baseHost";
    pub const CLUSTER_DOMAIN: &str = "clusterDomain";
}

// ============================================================================
// Name-keyed option access
// ============================================================================

/// Value stored under an option name: either a switch or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Text(String),
}

impl OptionValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(enabled) => *enabled,
            Self::Text(text) => !text.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Opaque option provider read by the core.
pub trait OptionsProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<OptionValue>;

    fn set(&self, name: &str, value: OptionValue);

    fn remove(&self, name: &str);

    /// `true` when the option is set to a truthy value.
    fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| value.is_truthy())
    }

    /// Non-empty string value of the option.
    fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|value| value.as_text().map(str::to_string))
    }

    /// Leading integer of a string option, like `parseInt`.
    fn number(&self, name: &str) -> Option<u64> {
        let text = self.text(name)?;
        let digits: String =
            text.trim().chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

/// Thread-safe in-memory [`OptionsProvider`].
#[derive(Debug, Default)]
pub struct SharedOptions {
    values: RwLock<BTreeMap<String, OptionValue>>,
}

impl SharedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &SeedOptions) -> Self {
        Self { values: RwLock::new(options.entries()) }
    }
}

impl OptionsProvider for SharedOptions {
    fn get(&self, name: &str) -> Option<OptionValue> {
        self.values.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: OptionValue) {
        self.values.write().insert(name.to_string(), value);
    }

    fn remove(&self, name: &str) {
        self.values.write().remove(name);
    }
}

// ============================================================================
// Typed option set
// ============================================================================

/// Options recognized by the toolkit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedOptions {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub strict: bool,
    pub log_to_file: bool,
    pub log_file: Option<PathBuf>,
    pub org: Option<String>,
    pub silent_retry: bool,
    pub silent: bool,
    pub retries: Option<u32>,
    pub no_ts: bool,
    #[serde(rename = "useAPIHost")]
    pub use_api_host: bool,
    pub verbose: bool,
    pub http: bool,
    pub use_host_options: bool,
    pub base_host: Option<String>,
    pub cluster_domain: Option<String>,
    pub hosts: BTreeMap<HostKind, String>,
}

impl SeedOptions {
    /// Overlay `overrides` on top of `self`. Switches are OR-ed, values in
    /// `overrides` win.
    #[must_use]
    pub fn merged_with(self, overrides: SeedOptions) -> SeedOptions {
        let mut hosts = self.hosts;
        hosts.extend(overrides.hosts);

        SeedOptions {
            config: overrides.config.or(self.config),
            debug: self.debug || overrides.debug,
            strict: self.strict || overrides.strict,
            log_to_file: self.log_to_file || overrides.log_to_file,
            log_file: overrides.log_file.or(self.log_file),
            org: overrides.org.or(self.org),
            silent_retry: self.silent_retry || overrides.silent_retry,
            silent: self.silent || overrides.silent,
            retries: overrides.retries.or(self.retries),
            no_ts: self.no_ts || overrides.no_ts,
            use_api_host: self.use_api_host || overrides.use_api_host,
            verbose: self.verbose || overrides.verbose,
            http: self.http || overrides.http,
            use_host_options: self.use_host_options || overrides.use_host_options,
            base_host: overrides.base_host.or(self.base_host),
            cluster_domain: overrides.cluster_domain.or(self.cluster_domain),
            hosts,
        }
    }

    /// Flatten into `name -> value` entries for [`SharedOptions`].
    pub fn entries(&self) -> BTreeMap<String, OptionValue> {
        use option_names as n;

        let mut entries = BTreeMap::new();
        let mut text = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                entries.insert(name.to_string(), OptionValue::Text(value));
            }
        };
        text(n::CONFIG, self.config.as_ref().map(|p| p.display().to_string()));
        text(n::ORG, self.org.clone());
        text(n::RETRIES, self.retries.map(|r| r.to_string()));
        text(n::BASE_HOST, self.base_host.clone());
        text(n::CLUSTER_DOMAIN, self.cluster_domain.clone());
        for (kind, host) in &self.hosts {
            text(kind.as_str(), Some(host.clone()));
        }

        for (name, enabled) in [
            (n::DEBUG, self.debug),
            (n::STRICT, self.strict),
            (n::SILENT_RETRY, self.silent_retry),
            (n::SILENT, self.silent),
            (n::NO_TS, self.no_ts),
            (n::USE_API_HOST, self.use_api_host),
            (n::VERBOSE, self.verbose),
            (n::HTTP, self.http),
            (n::USE_HOST_OPTIONS, self.use_host_options),
        ] {
            entries.insert(name.to_string(), OptionValue::Flag(enabled));
        }

        let log_target = match &self.log_file {
            Some(path) => OptionValue::Text(path.display().to_string()),
            None => OptionValue::Flag(self.log_to_file),
        };
        entries.insert(n::LOG_TO_FILE.to_string(), log_target);

        entries
    }
}

/// Alternate host inputs outside the option set: the `API_HOST` environment
/// variable and the positional cluster/namespace arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSource {
    pub api_host: Option<String>,
    pub cluster: Option<String>,
    pub namespace: Option<String>,
}

impl HostSource {
    pub fn from_api_host(api_host: impl Into<String>) -> Self {
        Self { api_host: Some(api_host.into()), ..Self::default() }
    }

    pub fn from_cluster(cluster: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { api_host: None, cluster: Some(cluster.into()), namespace: Some(namespace.into()) }
    }
}

// ============================================================================
// Client tuning
// ============================================================================

/// Timeouts, retry cadence and host-composition rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    #[serde(with = "duration_millis", rename = "request_timeout_ms")]
    pub request_timeout: Duration,
    #[serde(with = "duration_millis", rename = "probe_timeout_ms")]
    pub probe_timeout: Duration,
    #[serde(with = "duration_millis", rename = "retry_pause_ms")]
    pub retry_pause: Duration,
    pub default_retries: u32,
    pub concurrency_limit: usize,
    pub cluster_domain: String,
    pub lab_domain_suffix: String,
    pub accept_invalid_certs: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            probe_timeout: Duration::from_millis(PROBE_TIMEOUT_MS),
            retry_pause: Duration::from_millis(DEFAULT_RETRY_PAUSE_MS),
            default_retries: DEFAULT_RETRIES,
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
            lab_domain_suffix: LAB_DOMAIN_SUFFIX.to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// OAuth client credentials used by the token endpoints.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub consumer_client_id: String,
    pub consumer_client_secret: String,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("consumer_client_id", &self.consumer_client_id)
            .field("consumer_client_secret", &"<redacted>")
            .finish()
    }
}

/// Everything the loader produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub options: SeedOptions,
    pub client: ClientSettings,
    pub auth: AuthSettings,
}

/// Serialize a Duration as milliseconds (u64)
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
