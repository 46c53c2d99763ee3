use derive_new::new;
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Id, Thing};

use super::{now, Timestamp};

pub type SnapshotId = Thing;

pub fn new_snapshot_id() -> SnapshotId {
    Thing::from((Snapshot::TABLE.to_string(), Id::uuid()))
}

/// One point-in-time totals record. Snapshots are cumulative state, not
/// deltas: each one holds the full totals as of `created_at`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Snapshot {
    #[new(value = "new_snapshot_id()")]
    pub id: SnapshotId,
    #[new(value = "now()")]
    pub created_at: Timestamp,
    /// Total registered users.
    pub users: i64,
    /// Users whose subscription is currently active.
    pub subscriptions: i64,
    /// Sum of view counters across all courses.
    pub views: i64,
}

impl Snapshot {
    pub const TABLE: &'static str = "stats";

    /// A fresh snapshot for a new aggregation cycle, before any totals have
    /// been recorded into it.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }
}
