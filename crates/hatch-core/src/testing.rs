//! テスト用の worker。スクリプト通りに返信する。

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::domain::{Job, TransportError, WorkerId};
use crate::impls::MemoryPool;
use crate::ports::{ReplySender, WorkerHandle};

#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Answer every payload with this completion.
    Reply(Value),
    /// Answer with raw text, not necessarily a completion.
    Raw(String),
    /// Accept the payload, then drop the reply slot.
    DropReply,
    /// Accept the payload and never answer.
    Hold,
    /// Refuse at `send`.
    RefuseSend,
    /// Accept, then report a transport failure.
    TransportFail,
}

#[derive(Debug)]
pub(crate) struct ScriptedWorker {
    id: WorkerId,
    script: Script,
    sent: Mutex<Vec<String>>,
    held: Mutex<Vec<ReplySender>>,
}

impl ScriptedWorker {
    pub(crate) fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            id: WorkerId::generate(),
            script,
            sent: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl WorkerHandle for ScriptedWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn send(&self, payload: String, reply: ReplySender) -> Result<(), TransportError> {
        if matches!(self.script, Script::RefuseSend) {
            return Err(TransportError::Closed {
                worker: self.id.to_string(),
            });
        }
        self.sent.lock().unwrap().push(payload);

        match &self.script {
            Script::Reply(v) => reply.complete(v.to_string()),
            Script::Raw(text) => reply.complete(text.clone()),
            Script::DropReply => drop(reply),
            Script::Hold => self.held.lock().unwrap().push(reply),
            Script::TransportFail => reply.fail(TransportError::Disconnected {
                worker: self.id.to_string(),
            }),
            Script::RefuseSend => unreachable!(),
        }
        Ok(())
    }
}

pub(crate) fn pool_of(workers: Vec<Arc<ScriptedWorker>>) -> Arc<MemoryPool<Job>> {
    Arc::new(MemoryPool::new(
        workers
            .into_iter()
            .map(|w| w as Arc<dyn WorkerHandle>)
            .collect(),
    ))
}
