//! TaskStore port - tasks テーブルの正本（source of truth）

use async_trait::async_trait;

use crate::domain::{StoreError, Task, TaskId};

/// TaskStore は Task レコードの CRUD を提供
///
/// # 前提
/// - 並行呼び出しに対して安全であること（同時実行数は Gate の capacity まで）
/// - 同じ id への並行 update は store 側でそのまま交錯しうる。
///   versioning / compare-and-swap はコアの責務ではない
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task and return the id the store assigned.
    async fn insert(&self, task: Task) -> Result<TaskId, StoreError>;

    async fn get_all(&self) -> Result<Vec<Task>, StoreError>;

    async fn get_by_id(&self, id: TaskId) -> Result<Task, StoreError>;

    /// Update the record identified by `task.id`.
    async fn update(&self, task: Task) -> Result<(), StoreError>;

    async fn delete(&self, id: TaskId) -> Result<(), StoreError>;

    /// Tasks ordered by id, skipping `offset` and returning at most `limit`.
    async fn get_page(&self, offset: u64, limit: u64) -> Result<Vec<Task>, StoreError>;
}
