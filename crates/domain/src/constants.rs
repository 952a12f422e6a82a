//! Platform constants
//!
//! Centralized location for defaults and the (opaque) backend paths the core
//! talks to.

// Request defaults
pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_TIMEOUT_MS: u64 = 3 * 60 * 1000;
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_PAUSE_MS: u64 = 3000;
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 25;
pub const PROBE_TIMEOUT_MS: u64 = 10_000;

// Host composition
pub const DEFAULT_CLUSTER_DOMAIN: &str = "dev.ciondemand.com";
pub const LAB_DOMAIN_SUFFIX: &str = ".fyre.ibm.com";

// Headers
pub const CONSUMER_CONTEXT_HEADER: &str = "X-IBM-Consumer-Context";
pub const REDACTED_AUTHORIZATION: &str = "...hidden";

// Backend paths
pub const PROBE_PATH: &str = "/api/me";
pub const TOKEN_PATH: &str = "/api/token";
pub const CONSUMER_TOKEN_PATH: &str = "/consumer-api/token";
pub const SIGN_OUT_PATH: &str = "/api/me/sign-out";
pub const CONSUMER_SIGN_OUT_PATH: &str = "/consumer-api/me/sign-out";
pub const IDENTITY_PROVIDERS_PATH: &str = "/api/cloud/{scope}/identity-providers";
pub const CONSUMER_IDENTITY_PROVIDERS_PATH: &str = "/consumer-api/consumer/identity-providers";

// Environment variables
pub const ENV_API_HOST: &str = "API_HOST";
pub const ENV_CLIENT_ID: &str = "SEED_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SEED_CLIENT_SECRET";
pub const ENV_CONSUMER_CLIENT_ID: &str = "SEED_CONSUMER_CLIENT_ID";
pub const ENV_CONSUMER_CLIENT_SECRET: &str = "SEED_CONSUMER_CLIENT_SECRET";
