//! Handler trait - worker 内で実行されるロジック
//!
//! # 二層構造
//! - **表層（Typed）**: `Handler` trait - `ID` と入出力の型を静的に結びつける
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, JSON 値で受け渡し
//!
//! handler のソースを worker に送ることはしません。worker は同じバイナリに
//! リンクされた handler を `HandlerId` で引いて実行します。

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::scope::Scope;
use crate::domain::HandlerId;

/// Error raised by handler logic. Travels back as `{ error: { message, stack } }`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    frames: Vec<String>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Capture an error and its `source()` chain; each cause becomes a frame.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut frames = Vec::new();
        let mut cause = err.source();
        while let Some(e) = cause {
            frames.push(format!("caused by: {e}"));
            cause = e.source();
        }
        Self {
            message: err.to_string(),
            frames,
        }
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendered stack: the message line followed by indented frames.
    pub fn stack(&self) -> String {
        let mut out = format!("HandlerError: {}", self.message);
        for frame in &self.frames {
            out.push_str("\n    ");
            out.push_str(frame);
        }
        out
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::from_error(&err)
    }
}

/// A typed handler.
///
/// # 使用例
/// ```ignore
/// struct Sum;
///
/// #[async_trait]
/// impl Handler for Sum {
///     const ID: &'static str = "demo.sum.v1";
///     type Input = Vec<i64>;
///     type Output = i64;
///
///     async fn handle(&self, scope: &Scope, input: Vec<i64>) -> Result<i64, HandlerError> {
///         let factor: i64 = scope.get("factor")?;
///         Ok(input.iter().sum::<i64>() * factor)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    const ID: &'static str;

    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send;

    async fn handle(&self, scope: &Scope, input: Self::Input) -> Result<Self::Output, HandlerError>;

    fn handler_id() -> HandlerId {
        HandlerId::new(Self::ID)
    }
}

/// Object-safe form stored in the registry.
#[async_trait]
pub trait DynHandler: Send + Sync {
    fn id(&self) -> &str;

    async fn call(&self, scope: Scope, data: Value) -> Result<Value, HandlerError>;
}

/// Erases a typed `Handler` into a `DynHandler`.
pub struct TypedHandler<H: Handler> {
    handler: H,
}

impl<H: Handler> TypedHandler<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<H: Handler> DynHandler for TypedHandler<H> {
    fn id(&self) -> &str {
        H::ID
    }

    async fn call(&self, scope: Scope, data: Value) -> Result<Value, HandlerError> {
        let input: H::Input = serde_json::from_value(data)
            .map_err(|e| HandlerError::new(format!("input decode: {e}")))?;
        let output = self.handler.handle(&scope, input).await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Closure-backed handler, registered with `HandlerRegistry::register_fn`.
pub struct FnHandler<F, Fut> {
    id: HandlerId,
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn(Scope, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    pub fn new(id: impl Into<HandlerId>, f: F) -> Self {
        Self {
            id: id.into(),
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut> DynHandler for FnHandler<F, Fut>
where
    F: Fn(Scope, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    fn id(&self) -> &str {
        self.id.as_str()
    }

    async fn call(&self, scope: Scope, data: Value) -> Result<Value, HandlerError> {
        (self.f)(scope, data).await
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Sums a list and multiplies by the `factor` binding (default 1).
    pub struct SumHandler;

    #[async_trait]
    impl Handler for SumHandler {
        const ID: &'static str = "test.sum.v1";
        type Input = Vec<i64>;
        type Output = i64;

        async fn handle(&self, scope: &Scope, input: Vec<i64>) -> Result<i64, HandlerError> {
            let factor = if scope.contains("factor") {
                scope.get::<i64>("factor")?
            } else {
                1
            };
            Ok(input.iter().sum::<i64>() * factor)
        }
    }

    /// Echoes its input and the whole scope back: `{ "data": .., "ctx": {..} }`.
    pub struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        const ID: &'static str = "test.echo.v1";
        type Input = Value;
        type Output = Value;

        async fn handle(&self, scope: &Scope, input: Value) -> Result<Value, HandlerError> {
            let ctx: serde_json::Map<String, Value> = scope
                .names()
                .filter_map(|n| scope.get_raw(n).map(|v| (n.to_string(), v.clone())))
                .collect();
            Ok(serde_json::json!({ "data": input, "ctx": ctx }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{EchoHandler, SumHandler};
    use super::*;
    use serde_json::json;

    fn scope(v: Value) -> Scope {
        match v {
            Value::Object(map) => Scope::new(map),
            _ => Scope::default(),
        }
    }

    #[tokio::test]
    async fn typed_handler_decodes_input_and_encodes_output() {
        let h = TypedHandler::new(SumHandler);
        assert_eq!(h.id(), "test.sum.v1");

        let out = h.call(scope(json!({"factor": 10})), json!([1, 2, 3])).await.unwrap();
        assert_eq!(out, json!(60));
    }

    #[tokio::test]
    async fn typed_handler_rejects_wrong_input_shape() {
        let h = TypedHandler::new(SumHandler);
        let err = h.call(Scope::default(), json!({"not": "a list"})).await.unwrap_err();
        assert!(err.message().starts_with("input decode"));
    }

    #[tokio::test]
    async fn echo_handler_sees_bindings() {
        let h = TypedHandler::new(EchoHandler);
        let out = h.call(scope(json!({"a": 1})), json!("x")).await.unwrap();
        assert_eq!(out, json!({"data": "x", "ctx": {"a": 1}}));
    }

    #[tokio::test]
    async fn fn_handler_calls_closure() {
        let h = FnHandler::new("test.double.v1", |_scope, data: Value| async move {
            let n = data.as_i64().ok_or_else(|| HandlerError::new("not a number"))?;
            Ok::<_, HandlerError>(json!(n * 2))
        });
        assert_eq!(h.id(), "test.double.v1");
        assert_eq!(h.call(Scope::default(), json!(21)).await.unwrap(), json!(42));
    }

    #[test]
    fn stack_lists_causes() {
        let io = std::io::Error::other("disk on fire");
        let err = HandlerError::from_error(&io).with_frame("at test.handler.v1");
        assert_eq!(err.message(), "disk on fire");
        assert_eq!(
            err.stack(),
            "HandlerError: disk on fire\n    at test.handler.v1"
        );
    }
}
