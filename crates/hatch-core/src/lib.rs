//! hatch-core
//!
//! Dispatch jobs to isolated workers and settle a deferred result per job.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, handler_id, job, unit, completion, state, errors）
//! - **ports**: 抽象化レイヤー（WorkerPool, WorkerHandle）
//! - **app**: アプリケーションロジック（builder, jobs, dispatcher, bridge, packager, runtime）
//! - **typed**: 型付き Handler API（Handler trait, HandlerRegistry, Scope, PayloadCodec）
//! - **impls**: 実装（MemoryPool, ThreadWorker）
//! - **config**: pool の設定
//! - **observability**: pool のカウンタ

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;

#[cfg(test)]
mod testing;

pub use self::app::{BuildError, Deferred, Jobs, JobsBuilder};
pub use self::config::PoolConfig;
pub use self::domain::{HandlerId, JobConfig, JobError};
pub use self::typed::{Handler, HandlerError, Scope};
