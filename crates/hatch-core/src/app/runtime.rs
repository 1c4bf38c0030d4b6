//! Runtime - worker 側で ExecutableUnit を実行する
//!
//! # フロー
//! 1. unit のテキストを decode
//! 2. `HandlerId` で handler を引く
//! 3. bindings を `Scope` にし、埋め込まれた data を re-parse
//! 4. handler を await して `CompletionMessage` を作る
//!
//! どこで失敗しても `{ error: { message, stack } }` を返す。worker 自体は
//! 健全なまま次の unit を受け取れる（handler の panic も同様）。

use std::any::Any;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::domain::{CompletionMessage, ExecutableUnit};
use crate::typed::{HandlerRegistry, PayloadCodec, Scope};

pub struct Runtime {
    registry: Arc<HandlerRegistry>,
}

impl Runtime {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Execute one unit.
    pub async fn execute(&self, unit: ExecutableUnit) -> CompletionMessage {
        let ExecutableUnit {
            job_id,
            handler: handler_id,
            bindings,
            ..
        } = &unit;
        let frame = format!("at {handler_id} ({job_id})");

        let Some(handler) = self.registry.get(handler_id) else {
            return CompletionMessage::failure(
                format!("handler not found for id={handler_id}"),
                frame,
            );
        };

        let data = match unit.parse_data() {
            Ok(data) => data,
            Err(e) => {
                return CompletionMessage::failure(format!("data decode: {e}"), frame);
            }
        };
        let scope = Scope::new(bindings.clone());

        debug!(%job_id, %handler_id, "executing unit");
        let task = tokio::spawn(async move { handler.call(scope, data).await });

        match task.await {
            Ok(Ok(value)) => CompletionMessage::success(value),
            Ok(Err(err)) => {
                let err = err.with_frame(frame);
                CompletionMessage::failure(err.message(), err.stack())
            }
            Err(join) if join.is_panic() => {
                let message = panic_message(join.into_panic());
                CompletionMessage::failure(
                    format!("handler panicked: {message}"),
                    format!("panic: {message}\n    {frame}"),
                )
            }
            Err(join) => CompletionMessage::failure(format!("handler task aborted: {join}"), frame),
        }
    }

    /// Text in, text out: what a worker does with one payload.
    pub async fn execute_text(&self, payload: &str) -> String {
        let completion = match PayloadCodec::decode_unit(payload) {
            Ok(unit) => self.execute(unit).await,
            Err(e) => CompletionMessage::failure(e.to_string(), String::new()),
        };
        PayloadCodec::encode_completion(&completion).unwrap_or_else(|e| {
            json!({ "error": { "message": e.to_string(), "stack": "" } }).to_string()
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HandlerId, JobId};
    use crate::typed::HandlerError;
    use crate::typed::handler::fixtures::{EchoHandler, SumHandler};
    use serde_json::{Map, Value};

    fn runtime() -> Runtime {
        let mut reg = HandlerRegistry::new();
        reg.register(SumHandler).unwrap();
        reg.register(EchoHandler).unwrap();
        reg.register_fn("test.fail.v1", |_scope, _data| async move {
            Err::<Value, _>(HandlerError::new("boom"))
        })
        .unwrap();
        reg.register_fn("test.panic.v1", |_scope, _data| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, HandlerError>(Value::Null)
        })
        .unwrap();
        Runtime::new(Arc::new(reg))
    }

    fn unit(handler: &str, ctx: Value, data: &str) -> ExecutableUnit {
        ExecutableUnit {
            job_id: JobId::generate(),
            handler: HandlerId::new(handler),
            bindings: match ctx {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            data: data.to_string(),
        }
    }

    #[tokio::test]
    async fn runtime_executes_registered_handler_with_bindings() {
        let rt = runtime();
        let msg = rt.execute(unit("test.sum.v1", json!({"factor": 2}), "[1,2,3]")).await;
        assert_eq!(msg, CompletionMessage::success(json!(12)));
    }

    #[tokio::test]
    async fn runtime_reports_missing_handler() {
        let rt = runtime();
        let msg = rt.execute(unit("missing", json!({}), "{}")).await;
        let err = msg.error.unwrap();
        assert!(err.message.contains("handler not found"));
    }

    #[tokio::test]
    async fn handler_error_becomes_message_and_stack() {
        let rt = runtime();
        let msg = rt.execute(unit("test.fail.v1", json!({}), "{}")).await;
        let err = msg.error.unwrap();
        assert_eq!(err.message, "boom");
        assert!(err.stack.starts_with("HandlerError: boom\n    at test.fail.v1 (job-"));
    }

    #[tokio::test]
    async fn panic_is_reported_and_runtime_keeps_serving() {
        let rt = runtime();
        let msg = rt.execute(unit("test.panic.v1", json!({}), "{}")).await;
        assert_eq!(msg.error.unwrap().message, "handler panicked: kaboom");

        let msg = rt.execute(unit("test.sum.v1", json!({}), "[5]")).await;
        assert_eq!(msg.data, Some(json!(5)));
    }

    #[tokio::test]
    async fn execute_text_answers_garbage_with_an_error_completion() {
        let rt = runtime();
        let text = rt.execute_text("definitely not a unit").await;
        let msg = PayloadCodec::decode_completion(&text).unwrap();
        assert!(msg.error.unwrap().message.starts_with("decode executable unit"));
    }

    #[tokio::test]
    async fn embedded_data_with_quotes_roundtrips() {
        let rt = runtime();
        let data = json!({"s": "it's \"fine\""});
        let msg = rt
            .execute(unit("test.echo.v1", json!({"q": "'"}), &data.to_string()))
            .await;
        assert_eq!(msg.data, Some(json!({"data": data, "ctx": {"q": "'"}})));
    }
}
