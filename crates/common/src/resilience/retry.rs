//! Fixed-interval retry for fallible async operations
//!
//! An operation is attempted `max_retries + 1` times. The first success is
//! returned immediately; every failure is recorded, and an optional fixed
//! pause separates attempts (never after the last one). When every attempt
//! fails the recorded errors come back as [`RetryOutcome::Exhausted`]
//! instead of being raised.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, instrument, warn};

/// Default pause between attempts
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(3000);

/// Result of a retried operation
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T, E> {
    /// One of the attempts succeeded
    Success(T),
    /// Every attempt failed; errors are in attempt order
    Exhausted { retry_errors: Vec<E> },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Errors recorded when every attempt failed (empty on success).
    pub fn retry_errors(&self) -> &[E] {
        match self {
            Self::Success(_) => &[],
            Self::Exhausted { retry_errors } => retry_errors,
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Exhausted { .. } => None,
        }
    }

    /// Consume the outcome into a `Result` carrying every recorded error.
    pub fn into_result(self) -> Result<T, Vec<E>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Exhausted { retry_errors } => Err(retry_errors),
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Fixed pause between attempts, `None` to retry immediately
    pub pause: Option<Duration>,
    /// Suppress the per-attempt failure log
    pub silent: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 1, pause: Some(DEFAULT_PAUSE), silent: false }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn pause(mut self, pause: Duration) -> Self {
        self.config.pause = Some(pause);
        self
    }

    pub fn no_pause(mut self) -> Self {
        self.config.pause = None;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.config.silent = silent;
        self
    }

    pub fn build(self) -> RetryConfig {
        self.config
    }
}

/// The main retry executor
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic
    #[instrument(skip(self, operation), fields(max_retries = self.config.max_retries))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let total_attempts = self.config.total_attempts();
        let mut retry_errors = Vec::new();

        for attempt in 1..=total_attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded after {} retries", attempt - 1);
                    }
                    return RetryOutcome::Success(value);
                }
                Err(error) => {
                    let remaining = total_attempts - attempt;
                    if !self.config.silent {
                        let suffix = if remaining > 0 { " Retrying..." } else { "" };
                        warn!(
                            attempt,
                            total_attempts,
                            error = %error,
                            "Method failed (Attempt: {attempt}/{total_attempts}){suffix}"
                        );
                    }
                    retry_errors.push(error);

                    if remaining > 0 {
                        if let Some(pause) = self.config.pause.filter(|p| !p.is_zero()) {
                            tokio::time::sleep(pause).await;
                        }
                    }
                }
            }
        }

        debug!(attempts = total_attempts, "All retry attempts exhausted");
        RetryOutcome::Exhausted { retry_errors }
    }
}

/// Convenience function to retry an operation with the given configuration
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    RetryExecutor::new(config.clone()).execute(operation).await
}
