//! Errors - エラー型と分類
//!
//! 呼び出し側に見えるのは `JobError` だけです。どの経路で失敗しても
//! Deferred の failure 側に届きます（握りつぶさない・自動リトライしない）。

use thiserror::Error;

use super::handler_id::HandlerId;

/// ErrorKind は失敗の運用分類
///
/// - Validation: 投入時の検証エラー（pool には触れていない）
/// - Packaging: ExecutableUnit を作れなかった（worker は解放済み）
/// - Execution: worker 上の handler が失敗した（worker は健全とみなす）
/// - Infrastructure: worker との通信路そのものが壊れた
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Packaging,
    Execution,
    Infrastructure,
}

/// A failure of the worker channel itself (crash, disconnect, garbage reply).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("worker {worker} is not accepting payloads (channel closed)")]
    Closed { worker: String },

    #[error("worker {worker} went away before replying")]
    Disconnected { worker: String },

    #[error("worker {worker} sent a malformed completion message: {reason}")]
    MalformedReply { worker: String, reason: String },
}

/// The error a caller's deferred result rejects with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error(
        "job needs a registered handler (got `{handler}`).\nTry with:\n> jobs.job(\"my.handler.v1\", JobConfig::new())"
    )]
    MissingHandler { handler: HandlerId },

    #[error(
        "job needs an object as ctx (got {found}).\nTry with:\n> jobs.job(handler, JobConfig::new().with_ctx(json!({{ ... }})))"
    )]
    WrongContext { found: &'static str },

    #[error("job data is not transferable to a worker: {reason}")]
    DataNotSerializable { reason: String },

    #[error("{message}")]
    RemoteExecution { message: String, stack: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("job was dropped before it settled (pool torn down)")]
    Abandoned,

    #[error("job result does not match the expected type: {reason}")]
    Decode { reason: String },
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::MissingHandler { .. } | JobError::WrongContext { .. } => {
                ErrorKind::Validation
            }
            JobError::DataNotSerializable { .. } | JobError::Decode { .. } => ErrorKind::Packaging,
            JobError::RemoteExecution { .. } => ErrorKind::Execution,
            JobError::Transport(_) | JobError::Abandoned => ErrorKind::Infrastructure,
        }
    }

    /// Remote stack for `RemoteExecution`, if any.
    pub fn stack(&self) -> Option<&str> {
        match self {
            JobError::RemoteExecution { stack, .. } => Some(stack),
            _ => None,
        }
    }
}
