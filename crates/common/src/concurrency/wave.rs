//! Bounded fan-out in waves
//!
//! Calls are numbered from 1. Each index first resolves its arguments; an
//! index without arguments is skipped. Forked operations accumulate into a
//! wave that is awaited as a whole once it holds `limit` operations or the
//! last index has been visited. The next wave is only assembled after the
//! previous one settled, so at most `limit` operations are ever in flight.
//!
//! Futures are lazy: a wave's operations begin when the wave is joined, not
//! when they are forked.

use std::future::Future;

use futures::future::try_join_all;
use tracing::{debug, error, warn};

/// Wave size used when the caller passes no limit (or a limit of 0)
pub const DEFAULT_LIMIT: usize = 25;

/// Runs numbered calls in bounded waves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveRunner {
    limit: usize,
}

impl Default for WaveRunner {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT }
    }
}

impl WaveRunner {
    /// A `limit` of 0 falls back to [`DEFAULT_LIMIT`].
    pub fn new(limit: usize) -> Self {
        if limit == 0 {
            Self::default()
        } else {
            Self { limit }
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `operation` for every index in `1..=total_calls` whose arguments
    /// resolve to `Some`, returning results in ascending index order.
    ///
    /// The first failing operation aborts the batch and its error is
    /// returned; results of the other calls are discarded.
    pub async fn run<A, T, E, Op, OpFut, Args, ArgsFut>(
        &self,
        mut operation: Op,
        mut args_for_index: Args,
        total_calls: usize,
    ) -> Result<Vec<T>, E>
    where
        Op: FnMut(A) -> OpFut,
        OpFut: Future<Output = Result<T, E>>,
        Args: FnMut(usize) -> ArgsFut,
        ArgsFut: Future<Output = Option<A>>,
    {
        let mut results = Vec::with_capacity(total_calls);
        let mut wave = Vec::with_capacity(self.limit.min(total_calls));
        let mut wave_number = 0usize;

        for index in 1..=total_calls {
            match args_for_index(index).await {
                Some(args) => {
                    let call = operation(args);
                    wave.push(async move {
                        call.await.map_err(|err| {
                            error!(index, "Concurrent call failed, aborting batch");
                            err
                        })
                    });
                }
                None => warn!(index, "No arguments for call, skipping"),
            }

            if wave.len() == self.limit || index == total_calls {
                wave_number += 1;
                debug!(wave = wave_number, size = wave.len(), "Awaiting wave");
                results.extend(try_join_all(wave.drain(..)).await?);
            }
        }

        Ok(results)
    }
}

/// Run `operation` over `1..=total_calls` in waves of `limit`
/// (default [`DEFAULT_LIMIT`]).
pub async fn run_concurrent<A, T, E, Op, OpFut, Args, ArgsFut>(
    operation: Op,
    args_for_index: Args,
    total_calls: usize,
    limit: Option<usize>,
) -> Result<Vec<T>, E>
where
    Op: FnMut(A) -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Args: FnMut(usize) -> ArgsFut,
    ArgsFut: Future<Output = Option<A>>,
{
    WaveRunner::new(limit.unwrap_or(DEFAULT_LIMIT))
        .run(operation, args_for_index, total_calls)
        .await
}
