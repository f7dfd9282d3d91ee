//! In-memory TaskStore implementation (development / tests).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{StoreError, Task, TaskId};
use crate::ports::TaskStore;

/// Pending injected failures.
struct Faults {
    remaining: u32,
    error: StoreError,
}

struct InMemoryStoreState {
    /// Ordered by id so pages are stable.
    tasks: BTreeMap<TaskId, Task>,

    /// Next id to assign.
    next_id: i64,

    faults: Option<Faults>,
}

impl InMemoryStoreState {
    fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
            faults: None,
        }
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Consume one injected failure, if any are pending.
    fn take_fault(&mut self) -> Option<StoreError> {
        let faults = self.faults.as_mut()?;
        faults.remaining -= 1;
        let error = faults.error.clone();
        if faults.remaining == 0 {
            self.faults = None;
        }
        Some(error)
    }
}

/// In-memory store.
///
/// Every call first sleeps for the configured latency (outside the lock, so
/// calls can overlap), then checks for an injected failure, then touches the map.
pub struct InMemoryTaskStore {
    state: Arc<Mutex<InMemoryStoreState>>,
    latency: Duration,
    calls: AtomicU64,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState::new())),
            latency: Duration::ZERO,
            calls: AtomicU64::new(0),
        }
    }

    /// Artificial per-call latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next `n` calls fail with `error`. `n == 0` clears pending faults.
    pub async fn fail_next(&self, n: u32, error: StoreError) {
        let mut state = self.state.lock().await;
        state.faults = (n > 0).then_some(Faults { remaining: n, error });
    }

    /// Number of store calls made so far (including failed ones).
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Shared prologue: count, sleep, lock, maybe fail.
    async fn enter(&self) -> Result<tokio::sync::MutexGuard<'_, InMemoryStoreState>, StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut state = self.state.lock().await;
        if let Some(error) = state.take_fault() {
            return Err(error);
        }
        Ok(state)
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: Task) -> Result<TaskId, StoreError> {
        let mut state = self.enter().await?;
        let id = state.allocate_id();
        state.tasks.insert(id, task.with_id(id));
        Ok(id)
    }

    async fn get_all(&self) -> Result<Vec<Task>, StoreError> {
        let state = self.enter().await?;
        Ok(state.tasks.values().cloned().collect())
    }

    async fn get_by_id(&self, id: TaskId) -> Result<Task, StoreError> {
        let state = self.enter().await?;
        state.tasks.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, task: Task) -> Result<(), StoreError> {
        let mut state = self.enter().await?;
        let Some(id) = task.id else {
            return Err(StoreError::Permanent("update requires a task id".to_string()));
        };
        let Some(slot) = state.tasks.get_mut(&id) else {
            return Err(StoreError::NotFound(id));
        };
        *slot = task;
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        let mut state = self.enter().await?;
        state
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn get_page(&self, offset: u64, limit: u64) -> Result<Vec<Task>, StoreError> {
        let state = self.enter().await?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(state.tasks.values().skip(offset).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(n: usize) -> InMemoryTaskStore {
        let store = InMemoryTaskStore::new();
        for i in 0..n {
            store
                .insert(Task::new(format!("title-{i}"), "content", false))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryTaskStore::new();
        let a = store.insert(Task::new("ab", "cd", false)).await.unwrap();
        let b = store.insert(Task::new("ef", "gh", true)).await.unwrap();
        assert_eq!(a, TaskId::new(1));
        assert_eq!(b, TaskId::new(2));

        let got = store.get_by_id(b).await.unwrap();
        assert_eq!(got.id, Some(b));
        assert!(got.status);
    }

    #[tokio::test]
    async fn update_and_delete_missing_id_is_not_found() {
        let store = InMemoryTaskStore::new();
        let missing = TaskId::new(42);

        let err = store
            .update(Task::new("ab", "cd", false).with_id(missing))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(missing));

        let err = store.delete(missing).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(missing));
    }

    #[tokio::test]
    async fn delete_of_last_task_empties_the_store() {
        let store = InMemoryTaskStore::new();
        assert!(store.is_empty().await);

        let id = store.insert(Task::new("ab", "cd", false)).await.unwrap();
        assert!(!store.is_empty().await);

        store.delete(id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_without_id_is_permanent() {
        let store = InMemoryTaskStore::new();
        let err = store.update(Task::new("ab", "cd", false)).await.unwrap_err();
        assert!(matches!(err, StoreError::Permanent(_)));
    }

    #[tokio::test]
    async fn update_replaces_record() {
        let store = seeded(1).await;
        let id = TaskId::new(1);
        store
            .update(Task::new("new title", "new content", true).with_id(id))
            .await
            .unwrap();
        let got = store.get_by_id(id).await.unwrap();
        assert_eq!(got.title, "new title");
        assert!(got.status);
    }

    #[tokio::test]
    async fn page_is_ordered_and_bounded() {
        let store = seeded(5).await;

        let page = store.get_page(2, 2).await.unwrap();
        let ids: Vec<i64> = page.iter().filter_map(|t| t.id).map(TaskId::get).collect();
        assert_eq!(ids, vec![3, 4]);

        assert!(store.get_page(10, 5).await.unwrap().is_empty());
        assert_eq!(store.get_page(4, 100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn injected_faults_are_consumed_in_order() {
        let store = InMemoryTaskStore::new();
        store
            .fail_next(2, StoreError::Transient("conn reset".into()))
            .await;

        assert!(store.get_all().await.is_err());
        assert!(store.get_all().await.is_err());
        assert!(store.get_all().await.is_ok());
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn failed_insert_does_not_consume_an_id() {
        let store = InMemoryTaskStore::new();
        store.fail_next(1, StoreError::Permanent("unique".into())).await;
        assert!(store.insert(Task::new("ab", "cd", false)).await.is_err());
        let id = store.insert(Task::new("ab", "cd", false)).await.unwrap();
        assert_eq!(id, TaskId::new(1));
        assert_eq!(store.len().await, 1);
    }
}
