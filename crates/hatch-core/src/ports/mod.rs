//! Ports - 抽象化レイヤー
//!
//! dispatch core と外部コラボレータ（worker pool とその worker）との境界を
//! trait として定義します。実装は `impls` に置きます。

pub mod worker_handle;
pub mod worker_pool;

pub use self::worker_handle::{ReplySender, WorkerHandle, WorkerSignal, reply_channel};
pub use self::worker_pool::{PoolError, Tick, WorkerPool};
