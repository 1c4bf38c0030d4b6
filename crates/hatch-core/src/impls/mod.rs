//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **MemoryPool**: プロセス内の worker pool（FIFO + idle list）
//! - **ThreadWorker**: 専用スレッドで handler を実行する worker

pub mod memory_pool;
pub mod thread_worker;

pub use self::memory_pool::MemoryPool;
pub use self::thread_worker::ThreadWorker;
