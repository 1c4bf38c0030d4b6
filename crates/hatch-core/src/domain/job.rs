//! Job - 投入された 1 件の仕事
//!
//! Job は投入時に作られ、Transport Bridge にちょうど一度だけ消費され、
//! settle された時点で破棄されます。再利用・自動リトライはしません。

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use super::errors::JobError;
use super::handler_id::HandlerId;
use super::ids::JobId;

/// What the caller's deferred result eventually receives.
pub type Settlement = Result<Value, JobError>;

/// A data payload that can be snapshotted for transfer to a worker.
///
/// `Serialize + Send` な型は全てこれを実装します。シリアライズ自体が
/// 失敗しうる（非文字列キーの map、独自 `Serialize` のエラーなど）ので、
/// 実際に転送可能かどうかは packager の precheck で判定します。
pub trait Payload: Send + 'static {
    fn to_wire(&self) -> Result<Vec<u8>, serde_json::Error>;
}

impl<T> Payload for T
where
    T: Serialize + Send + 'static,
{
    fn to_wire(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Submission options: the context bindings and the data payload.
///
/// ```ignore
/// let config = JobConfig::new()
///     .with_ctx(json!({ "factor": 2 }))
///     .with_data(vec![1, 2, 3]);
/// ```
#[derive(Default)]
pub struct JobConfig {
    pub(crate) ctx: Option<Value>,
    pub(crate) data: Option<Box<dyn Payload>>,
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context variables the handler sees as bindings. Must be a JSON object.
    pub fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    pub fn with_data<D: Payload>(mut self, data: D) -> Self {
        self.data = Some(Box::new(data));
        self
    }
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobConfig")
            .field("ctx", &self.ctx)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}

/// Single-fire sender bound to the caller's awaiting future.
pub struct Settler {
    tx: oneshot::Sender<Settlement>,
}

impl Settler {
    pub fn channel() -> (Self, oneshot::Receiver<Settlement>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Consume the settler. Returns `false` when the caller already dropped its future.
    pub fn settle(self, result: Settlement) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// The unit of pending work as seen by the dispatch core.
pub struct Job {
    id: JobId,
    handler: HandlerId,
    context: Map<String, Value>,
    data: Box<dyn Payload>,
    settler: Settler,
}

impl Job {
    pub fn new(
        handler: HandlerId,
        context: Map<String, Value>,
        data: Box<dyn Payload>,
        settler: Settler,
    ) -> Self {
        Self {
            id: JobId::generate(),
            handler,
            context,
            data,
            settler,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn handler(&self) -> &HandlerId {
        &self.handler
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn data(&self) -> &dyn Payload {
        self.data.as_ref()
    }

    /// Settle the job exactly once; the job is consumed.
    pub fn settle(self, result: Settlement) -> bool {
        self.settler.settle(result)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("handler", &self.handler)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_serializes_plain_values() {
        let bytes = json!({"a": [1, 2]}).to_wire().unwrap();
        assert_eq!(bytes, br#"{"a":[1,2]}"#.to_vec());
    }

    #[test]
    fn payload_reports_unsupported_map_keys() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(vec![1u8], "value");
        assert!(map.to_wire().is_err());
    }

    #[tokio::test]
    async fn settle_delivers_once() {
        let (settler, rx) = Settler::channel();
        let job = Job::new(HandlerId::new("h"), Map::new(), Box::new(json!({})), settler);
        assert!(job.settle(Ok(json!(1))));
        assert_eq!(rx.await.unwrap().unwrap(), json!(1));
    }

    #[test]
    fn settle_reports_dropped_receiver() {
        let (settler, rx) = Settler::channel();
        drop(rx);
        assert!(!settler.settle(Ok(Value::Null)));
    }
}
