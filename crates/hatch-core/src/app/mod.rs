//! App - アプリケーション層
//!
//! ports を組み合わせて dispatch の流れを実装します。
//!
//! # 主要コンポーネント
//! - **JobsBuilder**: handler 登録と pool のワイヤリング
//! - **Jobs**: 呼び出し側のファサード（検証 → enqueue → Deferred）
//! - **Dispatcher**: 空き通知ごとに bridge を起動
//! - **bridge**: package → send → reply → release → settle
//! - **packager**: 転送可能性チェックと ExecutableUnit の組み立て
//! - **Runtime**: worker 側の unit 実行

pub mod bridge;
pub mod builder;
pub mod dispatcher;
pub mod jobs;
pub mod packager;
pub mod runtime;

pub use self::bridge::WorkerLease;
pub use self::builder::{BuildError, JobsBuilder};
pub use self::dispatcher::Dispatcher;
pub use self::jobs::{Deferred, Jobs};
pub use self::runtime::Runtime;
