use serde::{Deserialize, Serialize};

use super::task::{Task, TaskId};

/// Operation は WorkUnit 一つ分の「何をするか」
///
/// HTTP handler（外部）は検証済みリクエストからこれを作り、
/// `TaskService::execute` に渡す。CLI はスクリプトとして JSON から読む。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Insert { task: Task },
    GetAll,
    GetById { id: TaskId },
    Update { id: TaskId, task: Task },
    Delete { id: TaskId },
    Page {
        page: i64,
        #[serde(rename = "pageSize")]
        page_size: i64,
    },
}

impl Operation {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::GetAll => "get_all",
            Operation::GetById { .. } => "get_by_id",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
            Operation::Page { .. } => "get_page",
        }
    }
}
