//! JobsBuilder - handler 登録と worker pool のワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - worker と dispatcher が同じレジストリを共有する

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::jobs::Jobs;
use super::runtime::Runtime;
use crate::config::{ConfigError, PoolConfig};
use crate::domain::{HandlerId, Job};
use crate::impls::{MemoryPool, ThreadWorker};
use crate::ports::{PoolError, WorkerHandle};
use crate::typed::{Handler, HandlerError, HandlerRegistry, RegistryError, Scope};

/// JobsBuilder は `Jobs` を構築
///
/// # 使用例
/// ```ignore
/// let jobs = JobsBuilder::new()
///     .register(Sum)?
///     .expect_handlers(&["demo.sum.v1"])
///     .workers(2)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_handlers() で期待される handler id を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
pub struct JobsBuilder {
    registry: HandlerRegistry,
    expected: Option<Vec<String>>,
    config: PoolConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing handlers: {0:?}. These handlers were expected but not registered.")]
    MissingHandlers(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("worker pool: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl JobsBuilder {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            expected: None,
            config: PoolConfig::default(),
        }
    }

    pub fn register<H: Handler>(mut self, handler: H) -> Result<Self, RegistryError> {
        self.registry.register(handler)?;
        Ok(self)
    }

    pub fn register_fn<F, Fut>(mut self, id: impl Into<HandlerId>, f: F) -> Result<Self, RegistryError>
    where
        F: Fn(Scope, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.registry.register_fn(id, f)?;
        Ok(self)
    }

    pub fn expect_handlers(mut self, ids: &[&str]) -> Self {
        self.expected = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n;
        self
    }

    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate, spawn the worker threads, and start the dispatcher.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Jobs<MemoryPool<Job>>, BuildError> {
        self.config.validate()?;

        if let Some(expected) = &self.expected {
            let registered: Vec<String> = self
                .registry
                .registered_ids()
                .iter()
                .map(|id| id.to_string())
                .collect();
            let missing: Vec<String> = expected
                .iter()
                .filter(|x| !registered.contains(x))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingHandlers(missing));
            }
        }

        let registry = Arc::new(self.registry);
        let runtime = Arc::new(Runtime::new(Arc::clone(&registry)));

        let mut workers: Vec<Arc<dyn WorkerHandle>> = Vec::with_capacity(self.config.workers);
        for i in 0..self.config.workers {
            let worker = ThreadWorker::spawn(self.config.thread_name_for(i), Arc::clone(&runtime))?;
            workers.push(Arc::new(worker));
        }
        info!(
            workers = workers.len(),
            handlers = registry.len(),
            "jobs built"
        );

        Ok(Jobs::new(Arc::new(MemoryPool::new(workers)), registry))
    }
}

impl Default for JobsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
