//! # apiseed Infrastructure
//!
//! The request-orchestration core of the seeding toolkit.
//!
//! This crate contains:
//! - The JSON HTTP transport
//! - Host resolution for a deployment (with reachability probes)
//! - Sign-in/sign-out per application role
//! - The authenticated request façade
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Depends on `apiseed-domain` and `apiseed-common`
//! - Contains all "impure" code (network, files, environment)

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod hosts;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use api::{ApiClients, RequestFlags, RequestOptions, RequestResult};
pub use auth::{AuthClient, Credentials, IdentityProvider, SignIn};
pub use errors::InfraError;
pub use hosts::{HostResolver, HttpProbe, ReachabilityProbe};
pub use http::{HttpClient, HttpClientBuilder, JsonRequest, JsonResponse};
pub use logging::{init_logging, LoggingGuard};
