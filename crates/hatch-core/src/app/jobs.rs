//! Jobs - 呼び出し側のファサード
//!
//! # 使用例
//! ```ignore
//! let jobs = JobsBuilder::new()
//!     .register(Sum)?
//!     .workers(4)
//!     .build()?;
//!
//! let total = jobs
//!     .job("demo.sum.v1", JobConfig::new().with_ctx(json!({"factor": 2})).with_data(vec![1, 2, 3]))
//!     .await?;
//! jobs.stop().await;
//! ```
//!
//! 検証エラー（handler 未登録・ctx がオブジェクトでない）は pool に触れずに
//! その場で reject される。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::dispatcher::Dispatcher;
use crate::domain::{HandlerId, Job, JobConfig, JobError, JobId, Payload, Settlement, Settler};
use crate::impls::MemoryPool;
use crate::ports::WorkerPool;
use crate::typed::{Handler, HandlerRegistry};

/// The caller's deferred result. Settles exactly once.
#[must_use = "a Deferred does nothing unless awaited; the job still runs"]
pub struct Deferred {
    job_id: Option<JobId>,
    inner: DeferredInner,
}

enum DeferredInner {
    Rejected(Option<JobError>),
    Pending(oneshot::Receiver<Settlement>),
}

impl Deferred {
    fn rejected(err: JobError) -> Self {
        Self {
            job_id: None,
            inner: DeferredInner::Rejected(Some(err)),
        }
    }

    fn pending(job_id: JobId, rx: oneshot::Receiver<Settlement>) -> Self {
        Self {
            job_id: Some(job_id),
            inner: DeferredInner::Pending(rx),
        }
    }

    /// `None` when the submission was rejected before a job existed.
    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    /// Await and deserialize the success value into `T`.
    pub async fn decode<T: DeserializeOwned>(self) -> Result<T, JobError> {
        let value = self.await?;
        serde_json::from_value(value).map_err(|e| JobError::Decode {
            reason: e.to_string(),
        })
    }
}

impl Future for Deferred {
    type Output = Settlement;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            DeferredInner::Rejected(err) => {
                Poll::Ready(Err(err.take().unwrap_or(JobError::Abandoned)))
            }
            // sender dropped without settling: the pool discarded the job
            DeferredInner::Pending(rx) => Pin::new(rx)
                .poll(cx)
                .map(|r| r.unwrap_or(Err(JobError::Abandoned))),
        }
    }
}

pub struct Jobs<P: WorkerPool<Job> + 'static = MemoryPool<Job>> {
    pool: Arc<P>,
    handlers: Arc<HandlerRegistry>,
    dispatcher: JoinHandle<()>,
}

impl<P: WorkerPool<Job> + 'static> Jobs<P> {
    /// Wire a façade onto a pool. Must be called inside a tokio runtime.
    pub fn new(pool: Arc<P>, handlers: Arc<HandlerRegistry>) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&pool)).spawn();
        Self {
            pool,
            handlers,
            dispatcher,
        }
    }

    /// Submit a job. Never blocks; the returned `Deferred` settles once.
    pub fn job(&self, handler: impl Into<HandlerId>, config: JobConfig) -> Deferred {
        let handler = handler.into();
        let JobConfig { ctx, data } = config;

        let context = match self.validate(&handler, ctx) {
            Ok(context) => context,
            Err(err) => {
                debug!(%handler, error = %err, "submission rejected");
                return Deferred::rejected(err);
            }
        };
        let data: Box<dyn Payload> = data.unwrap_or_else(|| Box::new(Value::Object(Map::new())));

        let (settler, rx) = Settler::channel();
        let job = Job::new(handler, context, data, settler);
        let job_id = job.id();

        // 失敗時は job ごと drop される → Deferred は Abandoned で settle
        if let Err(err) = self.pool.enqueue(job) {
            warn!(%job_id, error = %err, "pool refused job");
        } else {
            debug!(%job_id, "job enqueued");
        }
        Deferred::pending(job_id, rx)
    }

    /// Typed submission for a registered `Handler`.
    pub fn submit<H>(&self, config: JobConfig) -> impl Future<Output = Result<H::Output, JobError>> + Send + 'static
    where
        H: Handler,
        H::Output: DeserializeOwned + 'static,
    {
        self.job(H::ID, config).decode::<H::Output>()
    }

    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Tear the pool down and wait for the dispatcher to exit.
    ///
    /// Jobs still queued are dropped by the pool and resolve to `JobError::Abandoned`.
    pub async fn stop(self) {
        self.pool.teardown();
        if let Err(e) = self.dispatcher.await {
            warn!(error = %e, "dispatcher task ended abnormally");
        }
    }

    fn validate(&self, handler: &HandlerId, ctx: Option<Value>) -> Result<Map<String, Value>, JobError> {
        if handler.is_empty() || !self.handlers.contains(handler) {
            return Err(JobError::MissingHandler {
                handler: handler.clone(),
            });
        }
        match ctx {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(JobError::WrongContext {
                found: kind_of(&other),
            }),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
