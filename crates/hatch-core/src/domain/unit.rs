use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::handler_id::HandlerId;
use super::ids::JobId;

/// The packaged, transportable form of a job.
///
/// - `bindings`: context variables, copied by value. The worker exposes them as a `Scope`.
/// - `data`: canonical JSON text of the payload snapshot. The worker re-parses it
///   before invoking the handler, so only a value copy ever crosses the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableUnit {
    pub job_id: JobId,
    pub handler: HandlerId,
    #[serde(default)]
    pub bindings: Map<String, Value>,
    pub data: String,
}

impl ExecutableUnit {
    /// Re-parse the embedded data snapshot.
    pub fn parse_data(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}
