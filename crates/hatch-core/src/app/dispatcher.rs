//! Dispatcher - pool の空き通知を受けて bridge を起動する
//!
//! グローバルな listener ではなく、façade が 1 つだけ所有するオブジェクト。
//! dispatcher 自身は CPU 仕事をせず、ペアごとに bridge を spawn するだけ。

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::bridge;
use crate::domain::Job;
use crate::ports::WorkerPool;

pub struct Dispatcher<P: ?Sized> {
    pool: Arc<P>,
}

impl<P> Dispatcher<P>
where
    P: WorkerPool<Job> + ?Sized + 'static,
{
    pub fn new(pool: Arc<P>) -> Self {
        Self { pool }
    }

    /// Service availability notifications until the pool is torn down.
    pub async fn run(self) {
        info!("dispatcher started");
        while let Some(tick) = self.pool.next_available().await {
            debug!(job_id = %tick.work.id(), worker_id = %tick.worker.id(), "worker available");
            tokio::spawn(bridge::dispatch(Arc::clone(&self.pool), tick));
        }
        info!("dispatcher stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
