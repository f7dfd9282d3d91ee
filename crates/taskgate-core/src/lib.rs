//! taskgate-core
//!
//! Task ストアへの呼び出しを「固定数のスロット」で絞りながら実行する
//! dispatch-and-retry コア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Task, TaskId, Outcome, Operation, errors）
//! - **ports**: 抽象化レイヤー（TaskStore）
//! - **impls**: 実装（InMemoryTaskStore など開発用）
//! - **gate**: 同時実行数を制限する counting semaphore
//! - **retry**: 固定間隔のリトライポリシー
//! - **store**: TaskStore をリトライポリシーで包むアダプタ
//! - **dispatcher**: WorkUnit を gate 越しに実行し、結果を一度だけ返す
//! - **pagination**: (page, page_size) → (offset, limit)
//! - **app**: TaskService と ServiceBuilder（ワイヤリング）
//! - **config**: 起動時設定
//! - **observability**: status views

pub mod domain;
pub mod ports;
pub mod impls;
pub mod gate;
pub mod retry;
pub mod store;
pub mod dispatcher;
pub mod pagination;
pub mod app;
pub mod config;
pub mod observability;

pub use app::{ServiceBuilder, TaskService};
pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use domain::{DispatchError, ErrorKind, Operation, Outcome, StoreError, Task, TaskId};
pub use gate::{Gate, GatePermit};
pub use ports::TaskStore;
pub use retry::{RetryMode, RetryPolicy};
pub use store::RetryingStore;
