//! Errors - エラー型と分類
//!
//! # 分類
//! - `StoreError`: TaskStore が返す生のエラー（Transient / Permanent / NotFound）
//! - `DispatchError`: 呼び出し側に届く最終的なエラー
//! - `ErrorKind`: HTTP ステータスを選ぶための運用分類
//! - `ConfigError`: 構築時の設定エラー（呼び出し時には発生しない）

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::task::TaskId;

/// ErrorKind は呼び出し側が応答を選ぶための分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Transient,
    Permanent,
    Timeout,
    PoolExhausted,
    Unavailable,
    Internal,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Transient => 503,
            ErrorKind::Permanent => 500,
            ErrorKind::Timeout => 504,
            ErrorKind::PoolExhausted => 503,
            ErrorKind::Unavailable => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// Errors reported by a `TaskStore` implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Connectivity / timeout class. Eligible for retry.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// Constraint / data class. Retrying cannot help.
    #[error("permanent store failure: {0}")]
    Permanent(String),

    #[error("task {0} not found")]
    NotFound(TaskId),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Transient(_) => ErrorKind::Transient,
            StoreError::Permanent(_) => ErrorKind::Permanent,
            StoreError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: description.into(),
        }
    }
}

/// Caller-side validation failure. Never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }

    pub fn single(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, description)])
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.fields
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid request")?;
        for (i, e) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{} {}", e.field, e.description)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// DispatchError は Dispatcher.submit の呼び出し側に届くエラー
///
/// 失敗は必ずここに現れる。「空の成功」と「失敗」を同じ値で表すことはない。
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The retry policy gave up; `source` is the last observed error.
    #[error("store operation failed after {attempts} attempt(s): {source}")]
    Store {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// The overall retry budget expired. The in-flight store call was cancelled.
    #[error("store operation timed out after {budget:?} ({attempts} attempt(s) started)")]
    Timeout { budget: Duration, attempts: u32 },

    #[error("no worker slot became free within {waited:?}")]
    PoolExhausted { waited: Duration },

    #[error("dispatcher is closed")]
    Closed,

    /// The worker context terminated without delivering a result (panic).
    #[error("worker terminated before delivering a result")]
    WorkerLost,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Validation(_) => ErrorKind::Validation,
            DispatchError::Store { source, .. } => source.kind(),
            DispatchError::Timeout { .. } => ErrorKind::Timeout,
            DispatchError::PoolExhausted { .. } => ErrorKind::PoolExhausted,
            DispatchError::Closed => ErrorKind::Unavailable,
            DispatchError::WorkerLost => ErrorKind::Internal,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

/// Invalid construction parameters. Rejected by the builder, never at call time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("gate capacity must be >= 1")]
    ZeroCapacity,

    #[error("retry policy needs at least one attempt")]
    ZeroAttempts,

    #[error("retry budget must be > 0")]
    ZeroBudget,

    #[error("acquire timeout must be > 0 when set")]
    ZeroAcquireTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DispatchError::Validation(ValidationError::single("title", "is required")), 400)]
    #[case(DispatchError::Store { attempts: 1, source: StoreError::NotFound(TaskId::new(3)) }, 404)]
    #[case(DispatchError::Store { attempts: 3, source: StoreError::Transient("conn reset".into()) }, 503)]
    #[case(DispatchError::Store { attempts: 1, source: StoreError::Permanent("unique".into()) }, 500)]
    #[case(DispatchError::Timeout { budget: Duration::from_secs(10), attempts: 2 }, 504)]
    #[case(DispatchError::PoolExhausted { waited: Duration::from_millis(50) }, 503)]
    #[case(DispatchError::Closed, 503)]
    #[case(DispatchError::WorkerLost, 500)]
    fn every_error_maps_to_a_status(#[case] err: DispatchError, #[case] status: u16) {
        assert_eq!(err.http_status(), status);
    }

    #[test]
    fn only_transient_store_errors_are_transient() {
        assert!(StoreError::Transient("x".into()).is_transient());
        assert!(!StoreError::Permanent("x".into()).is_transient());
        assert!(!StoreError::NotFound(TaskId::new(1)).is_transient());
    }

    #[test]
    fn validation_message_lists_fields() {
        let err = ValidationError::new(vec![
            FieldError::new("title", "is required"),
            FieldError::new("content", "is required"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid request: title is required, content is required"
        );
    }

    #[test]
    fn store_error_message_keeps_last_cause() {
        let err = DispatchError::Store {
            attempts: 3,
            source: StoreError::Transient("conn reset".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempt(s)"));
        assert!(msg.contains("conn reset"));
    }
}
