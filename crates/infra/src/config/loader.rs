//! Configuration loader
//!
//! Builds a [`Config`] from three layers, lowest precedence first:
//! 1. A config file (TOML or JSON, detected by extension): the path given by
//!    the `config` option, otherwise the first hit of [`probe_config_paths`]
//! 2. Environment variables (a `.env` file is loaded first when present)
//! 3. Options passed on the command line
//!
//! ## Environment Variables
//! - `SEED_CLIENT_ID` / `SEED_CLIENT_SECRET`: OAuth client for the admin and
//!   manager apps
//! - `SEED_CONSUMER_CLIENT_ID` / `SEED_CONSUMER_CLIENT_SECRET`: OAuth client
//!   for the consumer app
//! - `SEED_REQUEST_TIMEOUT_MS`: Absolute timeout of each request
//! - `SEED_RETRY_PAUSE_MS`: Pause between retry attempts
//! - `SEED_RETRIES`: Default retry count
//! - `SEED_CONCURRENCY_LIMIT`: Default wave size
//! - `SEED_CLUSTER_DOMAIN`: Domain appended to cluster/namespace hosts
//! - `SEED_ACCEPT_INVALID_CERTS`: Whether self-signed certificates are
//!   accepted (true/false)
//! - `API_HOST`: Base host, see [`host_source`]
//!
//! ## File Locations
//! The loader probes `config.{toml,json}` and `apiseed.{toml,json}` in the
//! current directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use apiseed_domain::constants::{
    ENV_API_HOST, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_CONSUMER_CLIENT_ID,
    ENV_CONSUMER_CLIENT_SECRET,
};
use apiseed_domain::{Config, HostSource, Result, SeedError, SeedOptions};

use crate::errors::InfraError;

const ENV_REQUEST_TIMEOUT_MS: &str = "SEED_REQUEST_TIMEOUT_MS";
const ENV_RETRY_PAUSE_MS: &str = "SEED_RETRY_PAUSE_MS";
const ENV_RETRIES: &str = "SEED_RETRIES";
const ENV_CONCURRENCY_LIMIT: &str = "SEED_CONCURRENCY_LIMIT";
const ENV_CLUSTER_DOMAIN: &str = "SEED_CLUSTER_DOMAIN";
const ENV_ACCEPT_INVALID_CERTS: &str = "SEED_ACCEPT_INVALID_CERTS";

const CONFIG_FILE_NAMES: [&str; 2] = ["apiseed.toml", "apiseed.json"];

/// Load configuration for a run, with `cli` options taking precedence
///
/// # Errors
/// Returns `SeedError::Config` if:
/// - The `config` option names a file that does not exist
/// - The file format is invalid or unsupported
/// - An environment variable holds an unparsable value
pub fn load(cli: SeedOptions) -> Result<Config> {
    load_dotenv();

    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => probe_config_paths(),
    };
    let mut config = match path {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env(&mut config)?;
    config.options = std::mem::take(&mut config.options).merged_with(cli);

    Ok(config)
}

/// Load configuration from defaults and environment variables only
///
/// # Errors
/// Returns `SeedError::Config` if a variable holds an invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env(&mut config)?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `SeedError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SeedError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SeedError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;

    parse_config(&contents, &config_path)
}

/// Host inputs outside the option set: `API_HOST` plus the positional
/// cluster/namespace arguments.
pub fn host_source(cluster: Option<String>, namespace: Option<String>) -> HostSource {
    HostSource {
        api_host: std::env::var(ENV_API_HOST).ok().filter(|host| !host.is_empty()),
        cluster,
        namespace,
    }
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SeedError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SeedError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the working directory, its two parents and the executable's
/// directory for `apiseed.toml` or `apiseed.json`
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    find_config_in(&dirs)
}

fn find_config_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }
}

fn apply_env(config: &mut Config) -> Result<()> {
    let auth = &mut config.auth;
    for (key, slot) in [
        (ENV_CLIENT_ID, &mut auth.client_id),
        (ENV_CLIENT_SECRET, &mut auth.client_secret),
        (ENV_CONSUMER_CLIENT_ID, &mut auth.consumer_client_id),
        (ENV_CONSUMER_CLIENT_SECRET, &mut auth.consumer_client_secret),
    ] {
        if let Some(value) = env_var(key) {
            *slot = value;
        }
    }

    let client = &mut config.client;
    if let Some(ms) = env_parse::<u64>(ENV_REQUEST_TIMEOUT_MS)? {
        client.request_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = env_parse::<u64>(ENV_RETRY_PAUSE_MS)? {
        client.retry_pause = Duration::from_millis(ms);
    }
    if let Some(retries) = env_parse(ENV_RETRIES)? {
        client.default_retries = retries;
    }
    if let Some(limit) = env_parse(ENV_CONCURRENCY_LIMIT)? {
        client.concurrency_limit = limit;
    }
    if let Some(domain) = env_var(ENV_CLUSTER_DOMAIN) {
        client.cluster_domain = domain;
    }
    client.accept_invalid_certs = env_bool(ENV_ACCEPT_INVALID_CERTS, client.accept_invalid_certs);

    Ok(())
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse a numeric environment variable, `None` when unset
///
/// # Errors
/// Returns `SeedError::Config` if the value does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| SeedError::Config(format!("Invalid {key}: {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 10] = [
        ENV_CLIENT_ID,
        ENV_CLIENT_SECRET,
        ENV_CONSUMER_CLIENT_ID,
        ENV_CONSUMER_CLIENT_SECRET,
        ENV_REQUEST_TIMEOUT_MS,
        ENV_RETRY_PAUSE_MS,
        ENV_RETRIES,
        ENV_CONCURRENCY_LIMIT,
        ENV_CLUSTER_DOMAIN,
        ENV_ACCEPT_INVALID_CERTS,
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_config(extension: &str, contents: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for value in ["1", "true", "YES", "on"] {
            std::env::set_var("TEST_SEED_BOOL", value);
            assert!(env_bool("TEST_SEED_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("TEST_SEED_BOOL", value);
            assert!(!env_bool("TEST_SEED_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("TEST_SEED_BOOL");
        assert!(env_bool("TEST_SEED_BOOL", true));
        assert!(!env_bool("TEST_SEED_BOOL", false));
    }

    #[test]
    fn test_load_from_env_reads_seed_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_CLIENT_ID, "provider-id");
        std::env::set_var(ENV_CLIENT_SECRET, "provider-secret");
        std::env::set_var(ENV_CONSUMER_CLIENT_ID, "consumer-id");
        std::env::set_var(ENV_RETRY_PAUSE_MS, "250");
        std::env::set_var(ENV_RETRIES, "3");
        std::env::set_var(ENV_CONCURRENCY_LIMIT, "10");
        std::env::set_var(ENV_ACCEPT_INVALID_CERTS, "false");

        let config = load_from_env().unwrap();
        assert_eq!(config.auth.client_id, "provider-id");
        assert_eq!(config.auth.client_secret, "provider-secret");
        assert_eq!(config.auth.consumer_client_id, "consumer-id");
        assert_eq!(config.auth.consumer_client_secret, "");
        assert_eq!(config.client.retry_pause, Duration::from_millis(250));
        assert_eq!(config.client.default_retries, 3);
        assert_eq!(config.client.concurrency_limit, 10);
        assert!(!config.client.accept_invalid_certs);
        assert_eq!(config.client.request_timeout, Duration::from_secs(180));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var(ENV_REQUEST_TIMEOUT_MS, "not-a-number");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, SeedError::Config(msg) if msg.contains(ENV_REQUEST_TIMEOUT_MS)));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = write_config(
            "json",
            r#"{
                "options": {"debug": true, "baseHost": "ns1.cluster.dev.example.com"},
                "client": {"request_timeout_ms": 5000},
                "auth": {"client_id": "file-id"}
            }"#,
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert!(config.options.debug);
        assert_eq!(config.options.base_host.as_deref(), Some("ns1.cluster.dev.example.com"));
        assert_eq!(config.client.request_timeout, Duration::from_secs(5));
        assert_eq!(config.auth.client_id, "file-id");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = write_config(
            "toml",
            r#"
[options]
useAPIHost = true
retries = 2

[client]
concurrency_limit = 5
"#,
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert!(config.options.use_api_host);
        assert_eq!(config.options.retries, Some(2));
        assert_eq!(config.client.concurrency_limit, 5);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_layers_file_env_and_cli() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let path = write_config(
            "toml",
            r#"
[options]
debug = true
org = "file-org"

[auth]
client_id = "file-id"
"#,
        );
        std::env::set_var(ENV_CLIENT_ID, "env-id");

        let cli =
            SeedOptions { config: Some(path.clone()), org: Some("cli-org".into()), ..Default::default() };
        let config = load(cli).unwrap();

        assert!(config.options.debug);
        assert_eq!(config.options.org.as_deref(), Some("cli-org"));
        assert_eq!(config.auth.client_id, "env-id");

        clear_env();
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_config_search_ignores_generic_file_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        let dirs = [dir.path().to_path_buf()];
        assert_eq!(find_config_in(&dirs), None);

        std::fs::write(dir.path().join("apiseed.json"), "{}").unwrap();
        assert_eq!(find_config_in(&dirs), Some(dir.path().join("apiseed.json")));

        std::fs::write(dir.path().join("apiseed.toml"), "").unwrap();
        assert_eq!(find_config_in(&dirs), Some(dir.path().join("apiseed.toml")));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, SeedError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = write_config("json", r#"{ "this is": "not valid json" "#);

        let err = load_from_file(Some(path.clone())).unwrap_err();
        assert!(matches!(err, SeedError::Config(msg) if msg.starts_with("Invalid JSON format")));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("test.yaml"));
        assert!(matches!(result, Err(SeedError::Config(_))));
    }

    #[test]
    fn test_host_source_reads_api_host() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let saved = std::env::var(ENV_API_HOST).ok();

        std::env::set_var(ENV_API_HOST, "https://manager.ns1.cluster.dev.example.com");
        let source = host_source(None, None);
        assert_eq!(source.api_host.as_deref(), Some("https://manager.ns1.cluster.dev.example.com"));

        std::env::set_var(ENV_API_HOST, "");
        let source = host_source(Some("cluster".into()), Some("ns".into()));
        assert_eq!(source.api_host, None);
        assert_eq!(source.cluster.as_deref(), Some("cluster"));

        match saved {
            Some(value) => std::env::set_var(ENV_API_HOST, value),
            None => std::env::remove_var(ENV_API_HOST),
        }
    }
}
