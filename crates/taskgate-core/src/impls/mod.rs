//! Impls - 実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: 開発用の TaskStore（障害注入・遅延注入つき）
//!
//! # 本番用実装
//! PostgreSQL 実装は別クレートに置く想定。コアは `TaskStore` trait にしか依存しない。

pub mod inmem_store;

pub use self::inmem_store::InMemoryTaskStore;
