//! PayloadCodec - 境界を越えるテキスト表現
//!
//! dispatcher → worker: `ExecutableUnit` の JSON テキスト
//! worker → dispatcher: `CompletionMessage` の JSON テキスト

use crate::domain::{CompletionMessage, ExecutableUnit};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },

    #[error("decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

pub struct PayloadCodec;

impl PayloadCodec {
    pub fn encode_unit(unit: &ExecutableUnit) -> Result<String, CodecError> {
        serde_json::to_string(unit).map_err(|e| CodecError::Encode {
            what: "executable unit",
            reason: e.to_string(),
        })
    }

    pub fn decode_unit(text: &str) -> Result<ExecutableUnit, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Decode {
            what: "executable unit",
            reason: e.to_string(),
        })
    }

    pub fn encode_completion(message: &CompletionMessage) -> Result<String, CodecError> {
        serde_json::to_string(message).map_err(|e| CodecError::Encode {
            what: "completion message",
            reason: e.to_string(),
        })
    }

    pub fn decode_completion(text: &str) -> Result<CompletionMessage, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::Decode {
            what: "completion message",
            reason: e.to_string(),
        })
    }
}
