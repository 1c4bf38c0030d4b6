//! CompletionMessage - worker から返ってくる唯一のメッセージ

use serde::{Deserialize, Serialize};

use super::errors::JobError;

/// Error raised by handler code inside the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub message: String,
    #[serde(default)]
    pub stack: String,
}

/// `{ data: <result> }` or `{ error: { message, stack } }`.
///
/// `error` が無い、または `null` なら成功として扱う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl CompletionMessage {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(RemoteError {
                message: message.into(),
                stack: stack.into(),
            }),
        }
    }

    /// Collapse into the job's settlement. Missing `data` on success is `null`.
    pub fn into_result(self) -> Result<serde_json::Value, JobError> {
        match self.error {
            None => Ok(self.data.unwrap_or(serde_json::Value::Null)),
            Some(RemoteError { message, stack }) => {
                Err(JobError::RemoteExecution { message, stack })
            }
        }
    }
}
