//! Scope - handler から見える context 変数
//!
//! 元々は「ローカル変数として宣言する」ものでしたが、ここでは構造化された
//! map をそのまま受け取り、名前で引けるようにしています。quoting も
//! escaping も存在しないので、文字列にどんな文字が入っていても壊れません。

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::handler::HandlerError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    bindings: Map<String, Value>,
}

impl Scope {
    pub fn new(bindings: Map<String, Value>) -> Self {
        Self { bindings }
    }

    /// Decode a bound variable into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, HandlerError> {
        let value = self
            .bindings
            .get(name)
            .ok_or_else(|| HandlerError::new(format!("ctx variable `{name}` is not bound")))?;
        T::deserialize(value).map_err(|e| {
            HandlerError::new(format!("ctx variable `{name}` has an unexpected shape: {e}"))
        })
    }

    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl From<Map<String, Value>> for Scope {
    fn from(bindings: Map<String, Value>) -> Self {
        Self::new(bindings)
    }
}
