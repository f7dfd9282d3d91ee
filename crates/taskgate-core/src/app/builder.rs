//! ServiceBuilder - TaskService の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - capacity = 0 は「永久に acquire できない gate」になるので build() で拒否する
//! - 呼び出し時ではなく起動時にエラーを返す
//! - Store はプロセスの bootstrap が作って渡す（グローバルな DB ハンドルは持たない）

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::service::TaskService;
use crate::config::{DEFAULT_CAPACITY, DispatchConfig};
use crate::dispatcher::Dispatcher;
use crate::domain::ConfigError;
use crate::gate::Gate;
use crate::ports::TaskStore;
use crate::retry::RetryPolicy;
use crate::store::RetryingStore;

/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::new()
///     .capacity(5)
///     .acquire_timeout(Duration::from_secs(2))
///     .build(Arc::new(store))?;
/// ```
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    capacity: usize,
    acquire_timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            acquire_timeout: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            capacity: config.capacity,
            acquire_timeout: config.acquire_timeout(),
            retry: config.retry_policy(),
        }
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// 検証してから組み立てる
    pub fn build<S: TaskStore + 'static>(self, store: Arc<S>) -> Result<TaskService<S>, ConfigError> {
        self.retry.validate()?;
        let mut gate = Gate::new(self.capacity)?;
        if let Some(timeout) = self.acquire_timeout {
            gate = gate.with_acquire_timeout(timeout)?;
        }

        info!(
            capacity = self.capacity,
            acquire_timeout_ms = self.acquire_timeout.map(|d| d.as_millis() as u64),
            max_attempts = self.retry.max_attempts,
            retry_delay_ms = self.retry.delay.as_millis() as u64,
            budget_ms = self.retry.budget.as_millis() as u64,
            retry_mode = ?self.retry.mode,
            "task service configured"
        );

        Ok(TaskService::new(
            Dispatcher::new(gate),
            RetryingStore::new(store, self.retry),
        ))
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
