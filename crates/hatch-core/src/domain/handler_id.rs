use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier a worker uses to look up handler code it already links.
///
/// 命名規約: `{namespace}.{action}.v{major}`（例: `demo.sum.v1`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for HandlerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HandlerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&HandlerId> for HandlerId {
    fn from(id: &HandlerId) -> Self {
        id.clone()
    }
}
