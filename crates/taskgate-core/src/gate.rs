//! Concurrency gate: a fixed-capacity counting semaphore.
//!
//! The number of permits is chosen at construction and never changes.
//! A permit is held for the duration of one WorkUnit and is returned when the
//! `GatePermit` is dropped, so every exit path (error, early return, panic
//! unwinding, cancellation) releases it.
//!
//! Wake-up order of blocked acquirers is unspecified. Callers must not rely
//! on FIFO hand-off.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::domain::{ConfigError, DispatchError};
use crate::observability::GateStats;

#[derive(Debug, Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    acquire_timeout: Option<Duration>,
}

impl Gate {
    /// A capacity of zero would block every acquire forever, so it is rejected here.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            acquire_timeout: None,
        })
    }

    /// Bound how long `acquire` may wait before failing with `PoolExhausted`.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroAcquireTimeout);
        }
        self.acquire_timeout = Some(timeout);
        Ok(self)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a permit.
    ///
    /// Without an acquire timeout this waits as long as it takes.
    pub async fn acquire(&self) -> Result<GatePermit, DispatchError> {
        let fut = Arc::clone(&self.semaphore).acquire_owned();
        let permit = match self.acquire_timeout {
            Some(waited) => tokio::time::timeout(waited, fut)
                .await
                .map_err(|_| DispatchError::PoolExhausted { waited })?,
            None => fut.await,
        };
        // acquire_owned only fails once the semaphore is closed
        let permit = permit.map_err(|_| DispatchError::Closed)?;
        Ok(GatePermit { _permit: permit })
    }

    /// Stop handing out permits. Holders keep theirs until they drop them.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn stats(&self) -> GateStats {
        let available = self.available();
        GateStats {
            capacity: self.capacity,
            available,
            in_use: self.capacity.saturating_sub(available),
            closed: self.is_closed(),
        }
    }
}

/// A borrowed slot. Dropping it returns the slot to the gate.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Explicit release; same as dropping.
    pub fn release(self) {}
}
