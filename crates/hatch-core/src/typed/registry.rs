//! HandlerRegistry - Handler の登録と管理
//!
//! # 設計
//! - 初期化時に組み立てる（mutable）
//! - 実行時は `Arc<HandlerRegistry>` として共有（immutable、ロック不要）
//!
//! worker はこのレジストリを同じバイナリ内で共有し、`HandlerId` だけを
//! 受け取って handler を引きます。

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use super::handler::{DynHandler, FnHandler, Handler, HandlerError, TypedHandler};
use super::scope::Scope;
use crate::domain::HandlerId;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler '{0}' is already registered")]
    AlreadyRegistered(HandlerId),

    #[error("Handler id must not be empty")]
    EmptyId,
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerId, Arc<dyn DynHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<H: Handler>(&mut self, handler: H) -> Result<(), RegistryError> {
        self.register_dyn(Arc::new(TypedHandler::new(handler)))
    }

    /// Register a closure under `id`.
    ///
    /// ```ignore
    /// registry.register_fn("demo.double.v1", |_scope, data| async move {
    ///     Ok::<_, HandlerError>(json!(data.as_i64().unwrap_or(0) * 2))
    /// })?;
    /// ```
    pub fn register_fn<F, Fut>(&mut self, id: impl Into<HandlerId>, f: F) -> Result<(), RegistryError>
    where
        F: Fn(Scope, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.register_dyn(Arc::new(FnHandler::new(id, f)))
    }

    pub fn register_dyn(&mut self, handler: Arc<dyn DynHandler>) -> Result<(), RegistryError> {
        let id = HandlerId::new(handler.id());
        if id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.handlers.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        self.handlers.insert(id, handler);
        Ok(())
    }

    pub fn get(&self, id: &HandlerId) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.handlers.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn registered_ids(&self) -> Vec<HandlerId> {
        let mut ids: Vec<HandlerId> = self.handlers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
