//! Outcome model: the success side of one WorkUnit.
//!
//! Failure is not a variant here. It is always the `Err` side of
//! `Result<Outcome, DispatchError>`, so "valid but empty" and "failed" can
//! never be confused.

use serde::{Deserialize, Serialize};

use super::task::{Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    /// Insert succeeded; the store assigned this id.
    Created(TaskId),

    Task(Task),

    /// Possibly empty. An empty list is still a success.
    Tasks(Vec<Task>),

    /// Success with nothing to return (update, delete).
    Empty,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}
