use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;

/// What [`join_with_policy`] does when one of its futures fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Resolve with the first error; the remaining futures are dropped.
    #[default]
    FailFast,
    /// Drive every future to completion and report failures alongside
    /// successes.
    Continue,
}

/// Outcome of a [`join_with_policy`] call that did not fail fast.
///
/// Items appear in completion order, not submission order.
#[derive(Debug)]
pub struct Settled<T, E> {
    pub succeeded: Vec<T>,
    pub failed: Vec<E>,
}

/// Wait for all `futures` concurrently (on the current task) under `policy`.
pub async fn join_with_policy<I, F, T, E>(futures: I, policy: FailurePolicy) -> Result<Settled<T, E>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let mut pending: FuturesUnordered<F> = futures.into_iter().collect();
    let mut settled = Settled { succeeded: Vec::with_capacity(pending.len()), failed: Vec::new() };
    while let Some(result) = pending.next().await {
        match (result, policy) {
            (Ok(output), _) => settled.succeeded.push(output),
            (Err(err), FailurePolicy::FailFast) => return Err(err),
            (Err(err), FailurePolicy::Continue) => settled.failed.push(err),
        }
    }
    Ok(settled)
}
