//! Configuration loading
//!
//! Reads config files, environment variables and `.env` into a
//! [`apiseed_domain::Config`].

pub mod loader;

// Re-export commonly used items
pub use loader::{host_source, load, load_from_env, load_from_file, probe_config_paths};
