//! Domain model (IDs, jobs, executable units, completion messages, errors).

pub mod completion;
pub mod errors;
pub mod handler_id;
pub mod ids;
pub mod job;
pub mod state;
pub mod unit;

pub use self::completion::{CompletionMessage, RemoteError};
pub use self::errors::{ErrorKind, JobError, TransportError};
pub use self::handler_id::HandlerId;
pub use self::ids::{JobId, WorkerId};
pub use self::job::{Job, JobConfig, Payload, Settlement, Settler};
pub use self::state::DispatchState;
pub use self::unit::ExecutableUnit;
