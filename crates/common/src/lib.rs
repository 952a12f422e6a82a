//! Runtime utilities shared across apiseed crates.
//!
//! - `resilience`: fixed-interval retry with a tagged outcome
//! - `concurrency`: wave-based bounded fan-out of async operations
//! - `storage`: in-process key-value cell for session tokens

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod concurrency;
pub mod resilience;
pub mod storage;

// Re-export commonly used types and traits for convenience
pub use concurrency::{run_concurrent, WaveRunner};
pub use resilience::{retry, RetryConfig, RetryConfigBuilder, RetryExecutor, RetryOutcome};
pub use storage::SessionStore;
