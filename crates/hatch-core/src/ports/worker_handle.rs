//! WorkerHandle port - 隔離された実行リソースへの参照
//!
//! worker とはテキストだけをやり取りします（共有メモリなし）。
//! 返信は 1 本の oneshot で `Result<String, TransportError>` として届くので、
//! message と error の二重 settle は型の上で起こりえません。

use std::fmt;

use tokio::sync::oneshot;

use crate::domain::{TransportError, WorkerId};

/// One signal per dispatch: the completion text, or a transport failure.
pub type WorkerSignal = Result<String, TransportError>;

/// Single-fire reply slot handed to the worker together with the payload.
///
/// Dropping it without calling `complete`/`fail` is observed by the dispatcher
/// as `TransportError::Disconnected`.
pub struct ReplySender {
    tx: oneshot::Sender<WorkerSignal>,
}

impl ReplySender {
    pub fn complete(self, completion: String) {
        // receiver gone means the dispatch was abandoned; nothing left to notify
        let _ = self.tx.send(Ok(completion));
    }

    pub fn fail(self, error: TransportError) {
        let _ = self.tx.send(Err(error));
    }
}

impl fmt::Debug for ReplySender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Arm a reply slot. The receiver side must exist before the payload is sent.
pub fn reply_channel() -> (ReplySender, oneshot::Receiver<WorkerSignal>) {
    let (tx, rx) = oneshot::channel();
    (ReplySender { tx }, rx)
}

/// An isolated execution resource owned by the pool and leased per dispatch.
pub trait WorkerHandle: Send + Sync + fmt::Debug {
    fn id(&self) -> WorkerId;

    /// Ship a packaged unit (as text). On error the reply slot is dropped unfired.
    fn send(&self, payload: String, reply: ReplySender) -> Result<(), TransportError>;
}
