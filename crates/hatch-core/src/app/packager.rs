//! Execution Packager - Job を worker に渡せる ExecutableUnit にする
//!
//! # フロー
//! 1. precheck: data をバイト列へシリアライズし、値として読み戻せるか確認
//! 2. 読み戻した snapshot を canonical な JSON テキストにして埋め込む
//! 3. context は map のまま値コピーで bindings に入れる（文字列生成はしない）
//!
//! 4. seal: unit をテキストにし、worker と同じ decode で読み戻す（ctx もここで検査）
//!
//! precheck / seal に失敗したら `DataNotSerializable` を返し、何も送らない。
//! 呼び出し側（bridge）が worker を解放する。

use serde_json::Value;

use crate::domain::{ExecutableUnit, Job, JobError, Payload};
use crate::typed::{CodecError, PayloadCodec};

pub fn package(job: &Job) -> Result<ExecutableUnit, JobError> {
    let snapshot = precheck(job.data())?;
    let data = serde_json::to_string(&snapshot).map_err(not_serializable)?;

    Ok(ExecutableUnit {
        job_id: job.id(),
        handler: job.handler().clone(),
        bindings: job.context().clone(),
        data,
    })
}

/// Package and encode the job into the text a worker receives.
///
/// The text is decoded back exactly as the worker will decode it, so bindings
/// the worker could not read fail here, before anything is sent.
pub fn seal(job: &Job) -> Result<String, JobError> {
    let unit = package(job)?;
    let text = PayloadCodec::encode_unit(&unit).map_err(codec_failure)?;
    PayloadCodec::decode_unit(&text).map_err(codec_failure)?;
    Ok(text)
}

/// Transferability check: the payload must serialize and parse back as a value.
///
/// Parsing back catches what serialization alone lets through, e.g. nesting
/// deeper than the parser's recursion limit.
pub fn precheck(data: &dyn Payload) -> Result<Value, JobError> {
    let bytes = data.to_wire().map_err(not_serializable)?;
    serde_json::from_slice(&bytes).map_err(not_serializable)
}

fn codec_failure(err: CodecError) -> JobError {
    JobError::DataNotSerializable {
        reason: err.to_string(),
    }
}

fn not_serializable(err: serde_json::Error) -> JobError {
    JobError::DataNotSerializable {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HandlerId, Settler};
    use rstest::rstest;
    use serde::{Serialize, Serializer};
    use serde_json::{Map, json};

    fn job_with(data: impl Payload, ctx: Value) -> Job {
        let ctx = match ctx {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let (settler, _rx) = Settler::channel();
        Job::new(HandlerId::new("test.echo.v1"), ctx, Box::new(data), settler)
    }

    struct LiveHandle;

    impl Serialize for LiveHandle {
        fn serialize<S: Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("live handles cannot cross the boundary"))
        }
    }

    #[rstest]
    #[case::string(json!("hello 'world' \"quoted\""))]
    #[case::integer(json!(42))]
    #[case::float(json!(-1.5))]
    #[case::boolean(json!(true))]
    #[case::null(Value::Null)]
    #[case::empty_object(json!({}))]
    #[case::nested(json!({"a": [1, {"b": null}], "c": {"d": ["x", false]}}))]
    fn data_survives_serialize_embed_reparse(#[case] data: Value) {
        let unit = package(&job_with(data.clone(), json!({}))).unwrap();
        assert_eq!(unit.parse_data().unwrap(), data);
    }

    #[test]
    fn context_is_copied_by_value_with_kinds_intact() {
        let ctx = json!({
            "name": "O'Brien said \"hi\"",
            "n": 7,
            "flag": false,
            "list": [1, 2],
            "obj": {"k": "v"}
        });
        let unit = package(&job_with(json!({}), ctx.clone())).unwrap();
        assert_eq!(Value::Object(unit.bindings), ctx);
    }

    #[test]
    fn unit_carries_job_identity() {
        let job = job_with(json!(1), json!({}));
        let unit = package(&job).unwrap();
        assert_eq!(unit.job_id, job.id());
        assert_eq!(unit.handler, HandlerId::new("test.echo.v1"));
    }

    #[test]
    fn failing_serialize_is_not_transferable() {
        let err = package(&job_with(LiveHandle, json!({}))).unwrap_err();
        assert!(matches!(err, JobError::DataNotSerializable { reason } if reason.contains("live handles")));
    }

    #[test]
    fn non_string_map_keys_are_not_transferable() {
        let mut data = std::collections::BTreeMap::new();
        data.insert((1, 2), "pair key");
        let err = package(&job_with(data, json!({}))).unwrap_err();
        assert!(matches!(err, JobError::DataNotSerializable { .. }));
    }

    #[test]
    fn nesting_past_the_parser_limit_is_not_transferable() {
        let mut deep = json!(0);
        for _ in 0..200 {
            deep = Value::Array(vec![deep]);
        }
        let err = precheck(&deep).unwrap_err();
        assert!(matches!(err, JobError::DataNotSerializable { .. }));
    }

    fn nested_arrays(depth: usize) -> Value {
        let mut deep = json!(0);
        for _ in 0..depth {
            deep = Value::Array(vec![deep]);
        }
        deep
    }

    #[test]
    fn deep_context_fails_sealing() {
        let job = job_with(json!({}), json!({ "k": nested_arrays(127) }));
        // packaging alone copies bindings without looking at them
        assert!(package(&job).is_ok());

        let err = seal(&job).unwrap_err();
        assert!(matches!(err, JobError::DataNotSerializable { reason } if reason.contains("recursion limit")));
    }

    #[test]
    fn sealed_text_decodes_to_the_packaged_unit() {
        let job = job_with(json!([1, 2]), json!({"q": "it's"}));
        let text = seal(&job).unwrap();
        assert_eq!(PayloadCodec::decode_unit(&text).unwrap(), package(&job).unwrap());
    }

    #[test]
    fn structs_are_snapshotted_as_values() {
        #[derive(Serialize)]
        struct Order {
            id: u32,
            items: Vec<&'static str>,
        }
        let unit = package(&job_with(Order { id: 9, items: vec!["a", "b"] }, json!({}))).unwrap();
        assert_eq!(unit.parse_data().unwrap(), json!({"id": 9, "items": ["a", "b"]}));
    }
}
