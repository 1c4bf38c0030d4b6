use serde::{Deserialize, Serialize};

/// Snapshot of a pool's occupancy and release accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCounts {
    pub idle: usize,
    pub busy: usize,
    pub queued: usize,
    pub enqueued_total: u64,
    pub released_total: u64,
    /// `free` calls for a worker that was not leased (double release).
    pub rejected_releases: u64,
}
