//! PoolConfig - worker pool の設定
//!
//! 環境変数:
//! - `HATCH_WORKERS`: worker 数（1 以上）
//! - `HATCH_THREAD_NAME`: worker スレッド名の接頭辞

use std::num::NonZeroUsize;
use std::thread;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_WORKERS: &str = "HATCH_WORKERS";
pub const ENV_THREAD_NAME: &str = "HATCH_THREAD_NAME";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidWorkers { var: &'static str, value: String },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("thread name prefix must not be empty")]
    EmptyThreadName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: usize,
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            thread_name: "hatch-worker".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` knows about.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_WORKERS) {
            config.workers = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidWorkers {
                    var: ENV_WORKERS,
                    value: raw.clone(),
                })?;
        }
        if let Some(name) = lookup(ENV_THREAD_NAME) {
            config.thread_name = name.trim().to_string();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.thread_name.is_empty() {
            return Err(ConfigError::EmptyThreadName);
        }
        Ok(())
    }

    pub fn thread_name_for(&self, index: usize) -> String {
        format!("{}-{index}", self.thread_name)
    }
}
