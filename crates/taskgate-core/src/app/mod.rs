//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **ServiceBuilder**: Gate / RetryPolicy / TaskStore のワイヤリングと起動時検証
//! - **TaskService**: HTTP handler（外部）が呼ぶ facade。操作ごとに WorkUnit を作り Dispatcher に渡す

pub mod builder;
pub mod service;

pub use self::builder::ServiceBuilder;
pub use self::service::TaskService;
