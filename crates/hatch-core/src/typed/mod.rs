//! Typed - 型付き Handler API
//!
//! handler の対応付けを `HandlerId` で静的に保証し、worker 側で
//! 同じレジストリから handler を引けるようにします。
//!
//! # 二層構造
//! - **表層（Typed）**: `Handler` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod codec;
pub mod handler;
pub mod registry;
pub mod scope;

pub use self::codec::{CodecError, PayloadCodec};
pub use self::handler::{DynHandler, FnHandler, Handler, HandlerError, TypedHandler};
pub use self::registry::{HandlerRegistry, RegistryError};
pub use self::scope::Scope;
