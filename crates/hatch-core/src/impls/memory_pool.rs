//! MemoryPool - プロセス内の worker pool
//!
//! # 実装詳細
//! - FIFO の work キューと idle worker のキューを Mutex で保護
//! - Notify で enqueue / free を `next_available` に知らせる
//! - lease 中の worker を記録し、二重 free は拒否して数える
//!
//! worker の生成・再生成はしません（渡された worker を使い回すだけ）。

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::domain::WorkerId;
use crate::observability::PoolCounts;
use crate::ports::{PoolError, Tick, WorkerHandle, WorkerPool};

struct PoolState<W> {
    queue: VecDeque<W>,
    idle: VecDeque<Arc<dyn WorkerHandle>>,
    leased: HashSet<WorkerId>,
    closed: bool,
    enqueued_total: u64,
    released_total: u64,
    rejected_releases: u64,
}

pub struct MemoryPool<W> {
    state: Mutex<PoolState<W>>,
    notify: Notify,
}

impl<W> MemoryPool<W> {
    pub fn new(workers: Vec<Arc<dyn WorkerHandle>>) -> Self {
        info!(workers = workers.len(), "worker pool started");
        Self {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                idle: workers.into_iter().collect(),
                leased: HashSet::new(),
                closed: false,
                enqueued_total: 0,
                released_total: 0,
                rejected_releases: 0,
            }),
            notify: Notify::new(),
        }
    }

    // a panic while holding the lock leaves the queues consistent; keep going
    fn lock(&self) -> MutexGuard<'_, PoolState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn counts(&self) -> PoolCounts {
        let state = self.lock();
        PoolCounts {
            idle: state.idle.len(),
            busy: state.leased.len(),
            queued: state.queue.len(),
            enqueued_total: state.enqueued_total,
            released_total: state.released_total,
            rejected_releases: state.rejected_releases,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[async_trait]
impl<W: Send + 'static> WorkerPool<W> for MemoryPool<W> {
    fn enqueue(&self, work: W) -> Result<(), PoolError> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            state.queue.push_back(work);
            state.enqueued_total += 1;
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn next_available(&self) -> Option<Tick<W>> {
        loop {
            // notified() を先に作っておけば、チェック後の notify を取りこぼさない
            let notified = self.notify.notified();
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if !state.queue.is_empty() && !state.idle.is_empty() {
                    if let (Some(work), Some(worker)) = (state.queue.pop_front(), state.idle.pop_front()) {
                        state.leased.insert(worker.id());
                        return Some(Tick { work, worker });
                    }
                }
            }
            notified.await;
        }
    }

    fn free(&self, worker: Arc<dyn WorkerHandle>) {
        {
            let mut state = self.lock();
            let id = worker.id();
            if !state.leased.remove(&id) {
                state.rejected_releases += 1;
                warn!(worker_id = %id, "free() for a worker that is not leased; ignoring");
                return;
            }
            state.released_total += 1;
            if state.closed {
                return;
            }
            state.idle.push_back(worker);
        }
        self.notify.notify_one();
    }

    fn teardown(&self) {
        let dropped = {
            let mut state = self.lock();
            state.closed = true;
            state.idle.clear();
            let dropped = state.queue.len();
            state.queue.clear();
            dropped
        };
        self.notify.notify_waiters();
        info!(dropped_jobs = dropped, "worker pool torn down");
    }
}
