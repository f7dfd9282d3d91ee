//! Ports - 抽象化レイヤー
//!
//! 外部の永続化層（PostgreSQL など）へのインターフェース。
//! コアはこの trait だけに依存し、接続プールの寿命はプロセスの bootstrap が持つ。

pub mod task_store;

pub use self::task_store::TaskStore;
