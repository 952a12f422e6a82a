//! Resilience patterns for transient failures
//!
//! Only one pattern is needed by the request pipeline: a bounded retry with
//! a fixed pause between attempts. Exhaustion is reported as a value
//! ([`RetryOutcome::Exhausted`]) rather than an error so callers decide how
//! loud a failed request should be.

pub mod retry;

pub use retry::{retry, RetryConfig, RetryConfigBuilder, RetryExecutor, RetryOutcome};
