//! Command-line flags and their mapping onto [`SeedOptions`]

use std::collections::BTreeMap;
use std::path::PathBuf;

use apiseed_domain::{AppRole, HostKind, HostTarget, SeedOptions};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "apiseed", version)]
#[command(about = "Seed and drive traffic against an API-management deployment")]
#[command(long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub options: OptionArgs,

    /// Cluster the deployment runs on (used with NAMESPACE instead of API_HOST)
    pub cluster: Option<String>,

    /// Namespace of the deployment within CLUSTER
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve hosts and print them as JSON
    Hosts {
        /// Host kind to resolve, or `all`
        #[arg(default_value = "all")]
        target: HostTarget,

        /// Drop previously computed hosts first
        #[arg(long)]
        reset: bool,
    },

    /// Sign in and fire concurrent requests at one endpoint
    Traffic(TrafficArgs),
}

#[derive(Args, Debug)]
pub struct TrafficArgs {
    /// Application to call: admin, manager or consumer
    pub role: AppRole,

    /// Endpoint path; `{index}` is replaced by the call number
    pub endpoint: String,

    /// HTTP method
    #[arg(short = 'm', long, default_value = "GET")]
    pub method: String,

    /// Number of calls
    #[arg(short = 'n', long, default_value_t = 10)]
    pub calls: usize,

    /// Calls in flight per wave (defaults to the configured concurrency limit)
    #[arg(long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(Args, Debug, Default)]
pub struct CredentialArgs {
    #[arg(long, env = "SEED_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "SEED_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Sign in with an API key instead of username and password
    #[arg(long, env = "SEED_API_KEY", hide_env_values = true, conflicts_with = "username")]
    pub api_key: Option<String>,

    /// Use an existing bearer token; skips sign-in and sign-out
    #[arg(long, env = "SEED_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Identity provider (the application's default when omitted)
    #[arg(long)]
    pub idp: Option<String>,

    /// Provider organization (consumer role)
    #[arg(long)]
    pub provider_org: Option<String>,

    /// Catalog (consumer role)
    #[arg(long)]
    pub catalog: Option<String>,
}

/// Flags shared by every command.
#[derive(Args, Debug, Default)]
pub struct OptionArgs {
    /// Config file (TOML or JSON)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Treat failed requests as fatal
    #[arg(short = 'i', long, global = true)]
    pub strict: bool,

    /// Also log to a file; without a value, to output/seed_<timestamp>.log
    #[arg(short = 'l', long, global = true, num_args = 0..=1, default_missing_value = "")]
    pub log_to_file: Option<String>,

    /// Organization to seed
    #[arg(short = 'o', long, global = true)]
    pub org: Option<String>,

    /// Do not log retry attempts
    #[arg(short = 'q', long, global = true)]
    pub silent_retry: bool,

    /// No console logging
    #[arg(short = 's', long, global = true)]
    pub silent: bool,

    /// Default retry count for requests
    #[arg(short = 'r', long, global = true)]
    pub retries: Option<u32>,

    /// Omit timestamps from log lines
    #[arg(short = 't', long, global = true)]
    pub no_ts: bool,

    /// Prefer API_HOST over cluster and namespace
    #[arg(short = 'u', long, global = true)]
    pub use_api_host: bool,

    /// Trace logging, including request and response bodies
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Talk plain HTTP instead of HTTPS
    #[arg(short = 'x', long, global = true)]
    pub http: bool,

    /// Take hosts from the options below (or compute them from --base-host)
    #[arg(long, global = true)]
    pub use_host_options: bool,

    #[arg(short = 'b', long, global = true)]
    pub base_host: Option<String>,

    /// Domain appended to cluster/namespace hosts
    #[arg(long, global = true)]
    pub cluster_domain: Option<String>,

    #[command(flatten)]
    pub hosts: HostArgs,
}

/// One override per host kind.
#[derive(Args, Debug, Default)]
pub struct HostArgs {
    #[arg(long, global = true)]
    pub admin: Option<String>,
    #[arg(long, global = true)]
    pub manager: Option<String>,
    #[arg(long, global = true)]
    pub consumer: Option<String>,
    #[arg(long, global = true)]
    pub analytics_endpoint: Option<String>,
    #[arg(long, global = true)]
    pub portal_endpoint: Option<String>,
    #[arg(long, global = true)]
    pub portal_endpoint_base: Option<String>,
    #[arg(long, global = true)]
    pub custom_portal_endpoint_base: Option<String>,
    #[arg(long, global = true)]
    pub v5_gateway_endpoint: Option<String>,
    #[arg(long, global = true)]
    pub v5_gateway_endpoint_base: Option<String>,
    #[arg(long, global = true)]
    pub v6_gateway_endpoint: Option<String>,
    #[arg(long, global = true)]
    pub v6_gateway_endpoint_base: Option<String>,
}

impl HostArgs {
    fn into_map(self) -> BTreeMap<HostKind, String> {
        [
            (HostKind::Admin, self.admin),
            (HostKind::Manager, self.manager),
            (HostKind::Consumer, self.consumer),
            (HostKind::AnalyticsEndpoint, self.analytics_endpoint),
            (HostKind::PortalEndpoint, self.portal_endpoint),
            (HostKind::PortalEndpointBase, self.portal_endpoint_base),
            (HostKind::CustomPortalEndpointBase, self.custom_portal_endpoint_base),
            (HostKind::V5GatewayEndpoint, self.v5_gateway_endpoint),
            (HostKind::V5GatewayEndpointBase, self.v5_gateway_endpoint_base),
            (HostKind::V6GatewayEndpoint, self.v6_gateway_endpoint),
            (HostKind::V6GatewayEndpointBase, self.v6_gateway_endpoint_base),
        ]
        .into_iter()
        .filter_map(|(kind, host)| host.map(|host| (kind, host)))
        .collect()
    }
}

impl OptionArgs {
    pub fn into_seed_options(self) -> SeedOptions {
        let (log_to_file, log_file) = match self.log_to_file {
            Some(path) if path.is_empty() => (true, None),
            Some(path) => (true, Some(PathBuf::from(path))),
            None => (false, None),
        };

        SeedOptions {
            config: self.config,
            debug: self.debug,
            strict: self.strict,
            log_to_file,
            log_file,
            org: self.org,
            silent_retry: self.silent_retry,
            silent: self.silent,
            retries: self.retries,
            no_ts: self.no_ts,
            use_api_host: self.use_api_host,
            verbose: self.verbose,
            http: self.http,
            use_host_options: self.use_host_options,
            base_host: self.base_host,
            cluster_domain: self.cluster_domain,
            hosts: self.hosts.into_map(),
        }
    }
}
