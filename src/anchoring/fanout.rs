//! Concurrent fan-out over untrusted upstream servers
//!
//! Every call gets its own timeout. Results are collected in arrival order, so
//! a slow server never delays the answer from a fast one.

use std::future::Future;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;

use super::error::AnchorError;

/// Outcome of one upstream call
#[derive(Debug)]
pub struct Settled<T> {
    pub source: String,
    pub result: Result<T, AnchorError>,
    pub elapsed: Duration,
}

fn timeout_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn bounded<T, F>(
    source: String,
    fut: F,
    per_call: Duration,
) -> impl Future<Output = Settled<T>>
where
    F: Future<Output = Result<T, AnchorError>>,
{
    async move {
        let started = Instant::now();
        let result = match tokio::time::timeout(per_call, fut).await {
            Ok(r) => r,
            Err(_) => Err(AnchorError::Timeout(timeout_ms(per_call))),
        };
        Settled {
            source,
            result,
            elapsed: started.elapsed(),
        }
    }
}

/// Run every call to completion (or timeout), returning results in arrival order
pub async fn settle_all<T, F>(calls: Vec<(String, F)>, per_call: Duration) -> Vec<Settled<T>>
where
    F: Future<Output = Result<T, AnchorError>>,
{
    let mut pending: FuturesUnordered<_> = calls
        .into_iter()
        .map(|(source, fut)| bounded(source, fut, per_call))
        .collect();

    let mut out = Vec::with_capacity(pending.len());
    while let Some(settled) = pending.next().await {
        match &settled.result {
            Ok(_) => tracing::debug!(
                source = %settled.source,
                elapsed_ms = settled.elapsed.as_millis() as u64,
                "Upstream call succeeded"
            ),
            Err(e) => tracing::warn!(
                source = %settled.source,
                elapsed_ms = settled.elapsed.as_millis() as u64,
                error = %e,
                "Upstream call failed"
            ),
        }
        out.push(settled);
    }
    out
}

/// Return the first successful call; remaining calls are dropped
///
/// # Errors
///
/// Every call's error, in arrival order, when none succeeded. An empty `calls`
/// yields an empty error list.
pub async fn first_success<T, F>(
    calls: Vec<(String, F)>,
    per_call: Duration,
) -> Result<(String, T), Vec<(String, AnchorError)>>
where
    F: Future<Output = Result<T, AnchorError>>,
{
    first_preferred(calls, per_call, |_| true).await
}

/// Return the first success that satisfies `preferred`
///
/// Remaining calls are dropped as soon as a preferred value arrives. If none
/// does, every call runs to completion (or timeout) and the earliest success is
/// returned instead.
///
/// # Errors
///
/// Every call's error, in arrival order, when none succeeded.
pub async fn first_preferred<T, F, P>(
    calls: Vec<(String, F)>,
    per_call: Duration,
    preferred: P,
) -> Result<(String, T), Vec<(String, AnchorError)>>
where
    F: Future<Output = Result<T, AnchorError>>,
    P: Fn(&T) -> bool,
{
    let mut pending: FuturesUnordered<_> = calls
        .into_iter()
        .map(|(source, fut)| bounded(source, fut, per_call))
        .collect();

    let mut fallback = None;
    let mut errors = Vec::new();
    while let Some(settled) = pending.next().await {
        match settled.result {
            Ok(value) if preferred(&value) => {
                tracing::debug!(
                    source = %settled.source,
                    elapsed_ms = settled.elapsed.as_millis() as u64,
                    "First upstream success"
                );
                return Ok((settled.source, value));
            }
            Ok(value) => {
                if fallback.is_none() {
                    fallback = Some((settled.source, value));
                }
            }
            Err(e) => {
                tracing::debug!(source = %settled.source, error = %e, "Upstream call failed");
                errors.push((settled.source, e));
            }
        }
    }
    fallback.ok_or(errors)
}
