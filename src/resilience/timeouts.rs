//! Timeout enforcement.
//!
//! Every network-facing step of an acquisition (server selection, connect,
//! probe, close) and the acquisition as a whole race against a deadline.

use std::future::Future;
use std::time::Duration;

/// Raised when a guarded step overruns its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{step} exceeded {budget:?}")]
pub struct Elapsed {
    pub step: &'static str,
    pub budget: Duration,
}

/// Race `fut` against `budget`.
pub async fn with_timeout<F, T>(step: &'static str, budget: Duration, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(budget, fut)
        .await
        .map_err(|_| Elapsed { step, budget })
}
