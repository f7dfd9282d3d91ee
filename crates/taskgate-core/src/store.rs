//! Retrying store adapter: every store call goes through the retry policy.

use std::sync::Arc;

use crate::domain::{DispatchError, Task, TaskId};
use crate::pagination::PageWindow;
use crate::ports::TaskStore;
use crate::retry::RetryPolicy;

/// Wraps a `TaskStore` so each call gets the same timeout and retry policy.
///
/// Page reads are wrapped as well; the policy applies to all six operations.
pub struct RetryingStore<S: TaskStore> {
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<S: TaskStore> RetryingStore<S> {
    pub fn new(store: Arc<S>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn insert(&self, task: Task) -> Result<TaskId, DispatchError> {
        let store = &self.store;
        self.policy
            .run("insert", move || store.insert(task.clone()))
            .await
    }

    pub async fn get_all(&self) -> Result<Vec<Task>, DispatchError> {
        let store = &self.store;
        self.policy.run("get_all", move || store.get_all()).await
    }

    pub async fn get_by_id(&self, id: TaskId) -> Result<Task, DispatchError> {
        let store = &self.store;
        self.policy
            .run("get_by_id", move || store.get_by_id(id))
            .await
    }

    pub async fn update(&self, task: Task) -> Result<(), DispatchError> {
        let store = &self.store;
        self.policy
            .run("update", move || store.update(task.clone()))
            .await
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), DispatchError> {
        let store = &self.store;
        self.policy.run("delete", move || store.delete(id)).await
    }

    pub async fn get_page(&self, window: PageWindow) -> Result<Vec<Task>, DispatchError> {
        let store = &self.store;
        self.policy
            .run("get_page", move || store.get_page(window.offset, window.limit))
            .await
    }
}
