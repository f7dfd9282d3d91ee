//! Domain model (task records, outcomes, operations, errors).

pub mod errors;
pub mod operation;
pub mod outcome;
pub mod task;

pub use self::errors::{ConfigError, DispatchError, ErrorKind, FieldError, StoreError, ValidationError};
pub use self::operation::Operation;
pub use self::outcome::Outcome;
pub use self::task::{Task, TaskId};
