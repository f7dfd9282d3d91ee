//! Operation dispatcher.
//!
//! One tokio task per submission. Inside it: acquire a gate permit, run the
//! WorkUnit, drop the permit, send the result over a oneshot channel. The
//! caller awaits that channel exactly once, so from its point of view
//! `submit` is a plain `async fn` returning one result. The gate only limits
//! how many submissions run at the same time.

use std::future::Future;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::domain::DispatchError;
use crate::gate::Gate;
use crate::observability::GateStats;

/// Dispatcher owns the gate and runs WorkUnits behind it.
///
/// Cloning is cheap; clones share the same gate.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    gate: Gate,
}

impl Dispatcher {
    pub fn new(gate: Gate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn stats(&self) -> GateStats {
        self.gate.stats()
    }

    /// Refuse new submissions. Work that already holds a permit runs to completion.
    pub fn close(&self) {
        self.gate.close();
    }

    /// Run `work` behind the gate and wait for its result.
    ///
    /// Exactly one result is delivered per call:
    /// - the WorkUnit's own `Ok` / `Err`,
    /// - `PoolExhausted` / `Closed` if no permit was obtained,
    /// - `WorkerLost` if the worker panicked before sending.
    ///
    /// If the caller stops waiting (its future is dropped), the worker still
    /// finishes and releases its permit; the result is discarded.
    pub async fn submit<T, F, Fut>(&self, work: F) -> Result<T, DispatchError>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, DispatchError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let gate = self.gate.clone();

        tokio::spawn(async move {
            let result = run_gated(&gate, work).await;
            if tx.send(result).is_err() {
                debug!("caller went away before the result was delivered");
            }
        });

        match rx.await {
            Ok(result) => result,
            Err(_) => {
                warn!("worker dropped its result channel without sending");
                Err(DispatchError::WorkerLost)
            }
        }
    }
}

/// Acquire, run, release. The permit lives in this frame, so it is released
/// on return and during unwinding alike.
async fn run_gated<T, F, Fut>(gate: &Gate, work: F) -> Result<T, DispatchError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DispatchError>>,
{
    let permit = gate.acquire().await?;
    debug!(in_use = gate.stats().in_use, "worker slot acquired");

    let result = work().await;

    permit.release();
    debug!(available = gate.available(), "worker slot released");
    result
}
