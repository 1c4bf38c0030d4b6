//! ThreadWorker - 専用 OS スレッド上の隔離 worker
//!
//! 各 worker は自分のスレッドと current-thread の tokio runtime を持ちます。
//! dispatcher とはテキストの payload / completion だけをやり取りし、
//! 値を共有することはありません。
//!
//! - `ThreadWorker` を drop すると送信側が閉じ、スレッドは終了する
//! - スレッドが死んでいれば send は `TransportError::Closed`
//! - 実行中に死んだ場合、返信スロットが drop されるので dispatcher 側で
//!   `TransportError::Disconnected` になる

use std::fmt;
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::Runtime;
use crate::domain::{TransportError, WorkerId};
use crate::ports::{PoolError, ReplySender, WorkerHandle};

struct Request {
    payload: String,
    reply: ReplySender,
}

pub struct ThreadWorker {
    id: WorkerId,
    name: String,
    tx: mpsc::UnboundedSender<Request>,
}

impl ThreadWorker {
    pub fn spawn(name: impl Into<String>, runtime: Arc<Runtime>) -> Result<Self, PoolError> {
        let name = name.into();
        let id = WorkerId::generate();
        let (tx, rx) = mpsc::unbounded_channel();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PoolError::Spawn(format!("{name}: {e}")))?;

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || rt.block_on(serve(id, rx, runtime)))
            .map_err(|e| PoolError::Spawn(format!("{name}: {e}")))?;

        info!(worker_id = %id, %name, "worker thread started");
        Ok(Self { id, name, tx })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Has the worker thread stopped receiving?
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

async fn serve(id: WorkerId, mut rx: mpsc::UnboundedReceiver<Request>, runtime: Arc<Runtime>) {
    while let Some(Request { payload, reply }) = rx.recv().await {
        let completion = runtime.execute_text(&payload).await;
        reply.complete(completion);
    }
    debug!(worker_id = %id, "worker thread exiting");
}

impl WorkerHandle for ThreadWorker {
    fn id(&self) -> WorkerId {
        self.id
    }

    fn send(&self, payload: String, reply: ReplySender) -> Result<(), TransportError> {
        self.tx
            .send(Request { payload, reply })
            .map_err(|_| TransportError::Closed {
                worker: self.id.to_string(),
            })
    }
}

impl fmt::Debug for ThreadWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadWorker")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
