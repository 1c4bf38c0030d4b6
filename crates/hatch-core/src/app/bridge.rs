//! Transport Bridge - 1 つの ExecutableUnit を 1 つの worker に送り、結果を Job に返す
//!
//! # フロー
//! 1. worker を `WorkerLease` で包む（解放はちょうど 1 回）
//! 2. packager で unit を作る（失敗 → 解放して failure で settle）
//! 3. 返信スロットを用意してから send（速い返信を取りこぼさない）
//! 4. 返信 1 件を待つ → 解放 → settle
//!
//! 返信は `Result<String, TransportError>` の 1 本だけなので、
//! message と error が両方 settle することはない。

use std::sync::Arc;

use tracing::{debug, warn};

use super::packager;
use crate::domain::{
    DispatchState, Job, JobError, Settlement, TransportError, WorkerId,
};
use crate::ports::{ReplySender, Tick, WorkerHandle, WorkerPool, reply_channel};
use crate::typed::PayloadCodec;

/// One dispatch's ownership of a worker. Returns it to the pool exactly once.
///
/// `release()` is the normal path; `Drop` covers paths that unwind past it.
pub struct WorkerLease<P: WorkerPool<Job> + ?Sized> {
    pool: Arc<P>,
    worker_id: WorkerId,
    worker: Option<Arc<dyn WorkerHandle>>,
}

impl<P: WorkerPool<Job> + ?Sized> WorkerLease<P> {
    pub fn new(pool: Arc<P>, worker: Arc<dyn WorkerHandle>) -> Self {
        Self {
            pool,
            worker_id: worker.id(),
            worker: Some(worker),
        }
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    fn send(&self, payload: String, reply: ReplySender) -> Result<(), TransportError> {
        match &self.worker {
            Some(worker) => worker.send(payload, reply),
            None => Err(TransportError::Closed {
                worker: self.worker_id.to_string(),
            }),
        }
    }

    pub fn release(mut self) {
        if let Some(worker) = self.worker.take() {
            self.pool.free(worker);
        }
    }
}

impl<P: WorkerPool<Job> + ?Sized> Drop for WorkerLease<P> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            warn!(worker_id = %self.worker_id, "worker lease dropped without release; returning it to the pool");
            self.pool.free(worker);
        }
    }
}

/// Drive one (job, worker) pair to settlement. Returns the terminal state.
pub async fn dispatch<P>(pool: Arc<P>, tick: Tick<Job>) -> DispatchState
where
    P: WorkerPool<Job> + ?Sized,
{
    let Tick { work: job, worker } = tick;
    let job_id = job.id();
    let lease = WorkerLease::new(pool, worker);
    let worker_id = lease.worker_id();
    let state = DispatchState::Pending;

    let payload = match packager::seal(&job) {
        Ok(payload) => payload,
        Err(err) => {
            debug!(%job_id, %worker_id, error = %err, "packaging failed");
            lease.release();
            return settle(job, Err(err), state);
        }
    };

    let (reply, signal) = reply_channel();
    if let Err(err) = lease.send(payload, reply) {
        warn!(%job_id, %worker_id, error = %err, "send to worker failed");
        lease.release();
        return settle(job, Err(err.into()), state);
    }
    let state = advance(state, DispatchState::Sent);
    debug!(%job_id, %worker_id, "unit sent");

    let signal = signal.await.unwrap_or_else(|_| {
        Err(TransportError::Disconnected {
            worker: worker_id.to_string(),
        })
    });
    lease.release();

    let result: Settlement = match signal {
        Ok(text) => PayloadCodec::decode_completion(&text)
            .map_err(|e| {
                JobError::from(TransportError::MalformedReply {
                    worker: worker_id.to_string(),
                    reason: e.to_string(),
                })
            })
            .and_then(|message| message.into_result()),
        Err(err) => {
            warn!(%job_id, %worker_id, error = %err, "worker transport failed");
            Err(err.into())
        }
    };

    settle(job, result, state)
}

fn advance(from: DispatchState, to: DispatchState) -> DispatchState {
    debug_assert!(from.can_advance_to(to), "illegal dispatch transition {from:?} -> {to:?}");
    to
}

fn settle(job: Job, result: Settlement, from: DispatchState) -> DispatchState {
    let job_id = job.id();
    let next = match &result {
        Ok(_) => DispatchState::SettledSuccess,
        Err(_) => DispatchState::SettledFailure,
    };
    let next = advance(from, next);
    if !job.settle(result) {
        debug!(%job_id, "caller dropped its deferred result before settlement");
    }
    debug!(%job_id, state = ?next, "job settled");
    next
}
