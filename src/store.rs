//! Query helpers for the three collections the aggregator touches.
//!
//! The `users` and `courses` tables belong to the marketplace backend; we
//! only ever aggregate over them. The `stats` table is owned by the
//! aggregator: appended once per cycle, with the newest record patched in
//! place through field-level merges.

use serde::Deserialize;

use crate::database::{deadline, Database, Result};

#[derive(Debug, Deserialize)]
struct TotalRow {
    total: i64,
}

/// `GROUP ALL` aggregates return no rows on an empty table.
fn total_or_zero(row: Option<TotalRow>) -> i64 {
    row.map_or(0, |row| row.total)
}

pub mod users {
    use super::*;

    pub async fn count_total(db: &Database) -> Result<i64> {
        let row: Option<TotalRow> = db
            .sql("SELECT count() AS total FROM users GROUP ALL")
            .fetch()
            .await?;

        Ok(total_or_zero(row))
    }

    pub async fn count_active(db: &Database) -> Result<i64> {
        let row: Option<TotalRow> = db
            .sql("SELECT count() AS total FROM users WHERE subscription.status = $status GROUP ALL")
            .bind(("status", "active"))
            .fetch()
            .await?;

        Ok(total_or_zero(row))
    }
}

pub mod courses {
    use super::*;

    pub async fn sum_views(db: &Database) -> Result<i64> {
        let row: Option<TotalRow> = db
            .sql("SELECT math::sum(views) AS total FROM courses GROUP ALL")
            .fetch()
            .await?;

        Ok(total_or_zero(row))
    }
}

pub mod snapshots {
    use derive_new::new;
    use serde::Serialize;
    use snafu::OptionExt as _;

    use crate::database::EmptyQuerySnafu;
    use crate::model::{now, Snapshot, SnapshotId, Timestamp};

    use super::*;

    pub async fn most_recent(db: &Database) -> Result<Option<Snapshot>> {
        db.sql("SELECT * FROM stats ORDER BY created_at DESC LIMIT 1")
            .fetch()
            .await
    }

    /// The `limit` most recent snapshots, newest first.
    pub async fn recent(limit: usize, db: &Database) -> Result<Vec<Snapshot>> {
        let query = format!("SELECT * FROM stats ORDER BY created_at DESC LIMIT {limit}");
        db.sql(query.as_str()).fetch().await
    }

    pub async fn append(snapshot: Snapshot, db: &Database) -> Result<Snapshot> {
        let created: Option<Snapshot> =
            deadline(db.create(snapshot.id.clone()).content(&snapshot)).await?;

        created.context(EmptyQuerySnafu)
    }

    /// The user-change trigger's half of the snapshot. Merging only these
    /// fields keeps the write disjoint from [ViewTotalsPatch], so concurrent
    /// triggers cannot lose each other's update.
    #[derive(Debug, Clone, PartialEq, Serialize, new)]
    pub struct UserTotalsPatch {
        pub users: i64,
        pub subscriptions: i64,
        #[new(value = "now()")]
        pub created_at: Timestamp,
    }

    /// The course-change trigger's half of the snapshot.
    #[derive(Debug, Clone, PartialEq, Serialize, new)]
    pub struct ViewTotalsPatch {
        pub views: i64,
        #[new(value = "now()")]
        pub created_at: Timestamp,
    }

    pub async fn merge_user_totals(
        id: SnapshotId,
        patch: UserTotalsPatch,
        db: &Database,
    ) -> Result<Snapshot> {
        let updated: Option<Snapshot> = deadline(db.update(id).merge(patch)).await?;
        updated.context(EmptyQuerySnafu)
    }

    pub async fn merge_view_totals(
        id: SnapshotId,
        patch: ViewTotalsPatch,
        db: &Database,
    ) -> Result<Snapshot> {
        let updated: Option<Snapshot> = deadline(db.update(id).merge(patch)).await?;
        updated.context(EmptyQuerySnafu)
    }
}
