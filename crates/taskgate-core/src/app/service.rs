//! TaskService - handler 向けの facade
//!
//! # フロー（操作 1 回分）
//! 1. 入力検証（create / update / page）。失敗したら dispatch しない
//! 2. RetryingStore を呼ぶ WorkUnit を作る
//! 3. Dispatcher::submit で gate 越しに実行し、結果を 1 回だけ受け取る
//!
//! 同じ id への並行 update は順序づけしない（versioning はしない）。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::domain::{DispatchError, ErrorKind, Operation, Outcome, Task, TaskId};
use crate::observability::GateStats;
use crate::pagination::PageRequest;
use crate::ports::TaskStore;
use crate::store::RetryingStore;

pub struct TaskService<S: TaskStore> {
    dispatcher: Dispatcher,
    store: Arc<RetryingStore<S>>,
}

impl<S: TaskStore> Clone for TaskService<S> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TaskStore + 'static> TaskService<S> {
    pub fn new(dispatcher: Dispatcher, store: RetryingStore<S>) -> Self {
        Self {
            dispatcher,
            store: Arc::new(store),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> GateStats {
        self.dispatcher.stats()
    }

    /// Stop accepting new operations.
    pub fn shutdown(&self) {
        info!("task service shutting down");
        self.dispatcher.close();
    }

    pub async fn create(&self, task: Task) -> Result<TaskId, DispatchError> {
        if let Err(err) = task.validate() {
            return rejected("insert", err.into());
        }
        let store = Arc::clone(&self.store);
        let result = self
            .dispatcher
            .submit(move || async move { store.insert(task).await })
            .await;
        log_result("insert", &result);
        result
    }

    pub async fn list(&self) -> Result<Vec<Task>, DispatchError> {
        let store = Arc::clone(&self.store);
        let result = self
            .dispatcher
            .submit(move || async move { store.get_all().await })
            .await;
        log_result("get_all", &result);
        result
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, DispatchError> {
        let store = Arc::clone(&self.store);
        let result = self
            .dispatcher
            .submit(move || async move { store.get_by_id(id).await })
            .await;
        log_result("get_by_id", &result);
        result
    }

    /// Replace the task stored under `id`. Any id inside `task` is ignored.
    pub async fn update(&self, id: TaskId, task: Task) -> Result<(), DispatchError> {
        if let Err(err) = task.validate() {
            return rejected("update", err.into());
        }
        let task = task.with_id(id);
        let store = Arc::clone(&self.store);
        let result = self
            .dispatcher
            .submit(move || async move { store.update(task).await })
            .await;
        log_result("update", &result);
        result
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), DispatchError> {
        let store = Arc::clone(&self.store);
        let result = self
            .dispatcher
            .submit(move || async move { store.delete(id).await })
            .await;
        log_result("delete", &result);
        result
    }

    /// 1-based page of tasks ordered by id.
    pub async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<Task>, DispatchError> {
        let window = match PageRequest::new(page, page_size).window() {
            Ok(window) => window,
            Err(err) => return rejected("get_page", err.into()),
        };
        let store = Arc::clone(&self.store);
        let result = self
            .dispatcher
            .submit(move || async move { store.get_page(window).await })
            .await;
        log_result("get_page", &result);
        result
    }

    /// Route one `Operation` and wrap the typed result as an `Outcome`.
    pub async fn execute(&self, op: Operation) -> Result<Outcome, DispatchError> {
        match op {
            Operation::Insert { task } => self.create(task).await.map(Outcome::Created),
            Operation::GetAll => self.list().await.map(Outcome::Tasks),
            Operation::GetById { id } => self.get(id).await.map(Outcome::Task),
            Operation::Update { id, task } => self.update(id, task).await.map(|()| Outcome::Empty),
            Operation::Delete { id } => self.delete(id).await.map(|()| Outcome::Empty),
            Operation::Page { page, page_size } => {
                self.list_page(page, page_size).await.map(Outcome::Tasks)
            }
        }
    }
}

fn rejected<T>(op: &'static str, err: DispatchError) -> Result<T, DispatchError> {
    let result = Err(err);
    log_result::<T>(op, &result);
    result
}

/// 最終結果のログはここだけで出す（retry 側は再試行のみ）。
/// 呼び出し側の誤り（validation / not found）は warn に留める。
fn log_result<T>(op: &'static str, result: &Result<T, DispatchError>) {
    match result {
        Ok(_) => info!(op, "task operation succeeded"),
        Err(err) => {
            let kind = err.kind();
            if is_caller_error(kind) {
                warn!(op, ?kind, error = %err, "task operation rejected");
            } else {
                error!(op, ?kind, error = %err, "task operation failed");
            }
        }
    }
}

fn is_caller_error(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Validation | ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ServiceBuilder;
    use crate::domain::StoreError;
    use crate::impls::InMemoryTaskStore;
    use rstest::rstest;

    fn service() -> (Arc<InMemoryTaskStore>, TaskService<InMemoryTaskStore>) {
        let store = Arc::new(InMemoryTaskStore::new());
        let service = ServiceBuilder::new()
            .build(Arc::clone(&store))
            .unwrap();
        (store, service)
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let (_store, svc) = service();

        let id = svc.create(Task::new("write docs", "for the gate", false)).await.unwrap();
        let got = svc.get(id).await.unwrap();
        assert_eq!(got.title, "write docs");

        svc.update(id, Task::new("write docs", "for the gate", true)).await.unwrap();
        assert!(svc.get(id).await.unwrap().status);

        assert_eq!(svc.list().await.unwrap().len(), 1);
        svc.delete(id).await.unwrap();
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_task_never_reaches_the_store() {
        let (store, svc) = service();
        let err = svc.create(Task::new("x", "ok content", false)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.http_status(), 400);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn update_uses_path_id() {
        let (_store, svc) = service();
        let id = svc.create(Task::new("ab", "cd", false)).await.unwrap();

        let body = Task::new("ef", "gh", true).with_id(TaskId::new(999));
        svc.update(id, body).await.unwrap();

        let got = svc.get(id).await.unwrap();
        assert_eq!(got.id, Some(id));
        assert_eq!(got.title, "ef");
    }

    #[tokio::test]
    async fn missing_task_maps_to_not_found() {
        let (_store, svc) = service();
        let err = svc.get(TaskId::new(5)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn execute_wraps_results_as_outcomes() {
        let (_store, svc) = service();

        let created = svc
            .execute(Operation::Insert { task: Task::new("ab", "cd", false) })
            .await
            .unwrap();
        assert_eq!(created, Outcome::Created(TaskId::new(1)));

        let page = svc
            .execute(Operation::Page { page: 2, page_size: 10 })
            .await
            .unwrap();
        assert_eq!(page, Outcome::Tasks(vec![]));

        let deleted = svc.execute(Operation::Delete { id: TaskId::new(1) }).await.unwrap();
        assert_eq!(deleted, Outcome::Empty);
    }

    #[tokio::test]
    async fn zero_page_size_is_an_empty_page() {
        let (store, svc) = service();
        svc.create(Task::new("ab", "cd", false)).await.unwrap();

        let page = svc.execute(Operation::Page { page: 1, page_size: 0 }).await.unwrap();
        assert_eq!(page, Outcome::Tasks(vec![]));
        // insert + get_page
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn negative_page_size_is_a_validation_error() {
        let (store, svc) = service();
        let err = svc.list_page(1, -1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_as_store_error() {
        let (store, svc) = service();
        store
            .fail_next(10, StoreError::Transient("db down".into()))
            .await;

        let err = svc.list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(store.calls(), 3);
        assert_eq!(svc.stats().available, 5);
    }

    #[rstest]
    #[case(ErrorKind::Validation, true)]
    #[case(ErrorKind::NotFound, true)]
    #[case(ErrorKind::Transient, false)]
    #[case(ErrorKind::Permanent, false)]
    #[case(ErrorKind::Timeout, false)]
    #[case(ErrorKind::PoolExhausted, false)]
    fn only_caller_errors_are_downgraded(#[case] kind: ErrorKind, #[case] downgraded: bool) {
        assert_eq!(is_caller_error(kind), downgraded);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_operations() {
        let (_store, svc) = service();
        svc.shutdown();
        let err = svc.list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
