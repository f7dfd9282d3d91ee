use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{FieldError, ValidationError};

/// Minimum length (in chars) for `title` and `content`.
pub const MIN_TEXT_LEN: usize = 2;

/// Store-assigned task identifier.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(v: i64) -> Self {
        Self(v)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for TaskId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// A task record.
///
/// `id` is `None` until the store has inserted the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TaskId>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: bool,
}

impl Task {
    pub fn new(title: impl Into<String>, content: impl Into<String>, status: bool) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            status,
        }
    }

    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    /// Checks the caller-side invariants before a task is handed to the dispatcher.
    ///
    /// Every offending field is reported, not just the first one.
    /// Whitespace counts like any other char: `"  "` is a valid title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        for (name, value) in [("title", &self.title), ("content", &self.content)] {
            let len = value.chars().count();
            if len == 0 {
                fields.push(FieldError::new(name, "is required"));
            } else if len < MIN_TEXT_LEN {
                fields.push(FieldError::new(
                    name,
                    format!("must be at least {MIN_TEXT_LEN} characters"),
                ));
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn valid_task_passes() {
        assert!(Task::new("buy milk", "two liters", false).validate().is_ok());
    }

    #[rstest]
    #[case("", "content", &["title"])]
    #[case("a", "content", &["title"])]
    #[case("title", "b", &["content"])]
    #[case("", " ", &["title", "content"])]
    fn invalid_fields_are_all_reported(
        #[case] title: &str,
        #[case] content: &str,
        #[case] expected: &[&str],
    ) {
        let err = Task::new(title, content, true).validate().unwrap_err();
        let names: Vec<&str> = err.fields().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn whitespace_is_counted_as_written() {
        assert!(Task::new("  ", "\t\n", false).validate().is_ok());
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        // 2 chars, 6 bytes
        assert!(Task::new("日本", "語語", false).validate().is_ok());
    }

    #[test]
    fn id_is_omitted_before_insertion() {
        let v = serde_json::to_value(Task::new("ab", "cd", true)).unwrap();
        assert!(v.get("id").is_none());

        let v = serde_json::to_value(Task::new("ab", "cd", true).with_id(TaskId::new(7))).unwrap();
        assert_eq!(v["id"], 7);
    }
}
