//! WorkerPool port - 外部コラボレータとしての pool
//!
//! キューイング・サイズ・worker の生成/再生成は pool 側の責務です。
//! dispatch core が要求するのは以下の契約だけ：
//! - `enqueue(work)`: いずれ空き worker とペアにされる
//! - `next_available()`: (work, worker) のペアを 1 つずつ通知
//! - `free(worker)`: dispatch ごとにちょうど 1 回返却される
//! - `teardown()`: 全リソースを解放

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::worker_handle::WorkerHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool has been torn down")]
    Closed,

    #[error("failed to start worker: {0}")]
    Spawn(String),
}

/// Availability notification: the next queued work item paired with a free worker.
pub struct Tick<W> {
    pub work: W,
    pub worker: Arc<dyn WorkerHandle>,
}

#[async_trait]
pub trait WorkerPool<W: Send + 'static>: Send + Sync {
    fn enqueue(&self, work: W) -> Result<(), PoolError>;

    /// Waits for the next (work, worker) pair. `None` once the pool is torn down.
    async fn next_available(&self) -> Option<Tick<W>>;

    fn free(&self, worker: Arc<dyn WorkerHandle>);

    fn teardown(&self);
}
