//! The rolling statistics aggregator.
//!
//! A snapshot is appended once per aggregation cycle; between cycles the
//! newest snapshot is patched in place whenever user or course data
//! changes. The two refresh operations write disjoint field sets, so they
//! are safe to run concurrently against the same record.

use derive_new::new;
use snafu::{Location, ResultExt as _, Snafu};
use tracing::instrument;

use crate::database::{Database, DatabaseError};
use crate::model::Snapshot;
use crate::store;
use crate::store::snapshots::{UserTotalsPatch, ViewTotalsPatch};

pub use report::{build_report, pad, trend, DashboardReport, SeriesPoint, Trend, SERIES_LEN};

mod report;

#[derive(Debug, Snafu)]
pub enum StatsError {
    /// Could not recompute the user totals
    UserTotals {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not recompute the view totals
    ViewTotals {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not append a snapshot for the new aggregation cycle
    AppendSnapshot {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not fetch the snapshot series
    FetchSeries {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Clone, new)]
pub struct Aggregator {
    database: Database,
}

impl Aggregator {
    /// Recompute the current snapshot's `users` and `subscriptions` totals.
    /// Fired on any change to the users table.
    #[instrument(skip(self))]
    pub async fn refresh_user_totals(&self) -> Result<(), StatsError> {
        let current = self.current_snapshot().await?;

        let users = store::users::count_total(&self.database)
            .await
            .context(UserTotalsSnafu)?;
        let subscriptions = store::users::count_active(&self.database)
            .await
            .context(UserTotalsSnafu)?;

        let patch = UserTotalsPatch::new(users, subscriptions);
        store::snapshots::merge_user_totals(current.id, patch, &self.database)
            .await
            .context(UserTotalsSnafu)?;

        tracing::debug!(users, subscriptions, "refreshed user totals");
        Ok(())
    }

    /// Recompute the current snapshot's `views` total. Fired on any change
    /// to the courses table.
    #[instrument(skip(self))]
    pub async fn refresh_view_totals(&self) -> Result<(), StatsError> {
        let current = self.current_snapshot().await?;

        let views = store::courses::sum_views(&self.database)
            .await
            .context(ViewTotalsSnafu)?;

        let patch = ViewTotalsPatch::new(views);
        store::snapshots::merge_view_totals(current.id, patch, &self.database)
            .await
            .context(ViewTotalsSnafu)?;

        tracing::debug!(views, "refreshed view totals");
        Ok(())
    }

    /// The most recent snapshot. If the series is empty this seeds an
    /// initial zero snapshot instead of failing, so a change trigger can
    /// always find a record to patch.
    pub async fn current_snapshot(&self) -> Result<Snapshot, StatsError> {
        let existing = store::snapshots::most_recent(&self.database)
            .await
            .context(FetchSeriesSnafu)?;

        match existing {
            Some(snapshot) => Ok(snapshot),
            None => {
                tracing::info!("no snapshot on record, seeding an initial one");
                self.begin_cycle().await
            }
        }
    }

    /// Append a fresh zero snapshot, starting a new aggregation cycle. The
    /// change triggers fill in its totals from here on.
    #[instrument(skip(self))]
    pub async fn begin_cycle(&self) -> Result<Snapshot, StatsError> {
        let snapshot = store::snapshots::append(Snapshot::zero(), &self.database)
            .await
            .context(AppendSnapshotSnafu)?;

        tracing::info!(id = %snapshot.id, "started a new aggregation cycle");
        Ok(snapshot)
    }

    /// Start a new cycle and immediately bring its totals up to date.
    pub async fn roll_cycle(&self) -> Result<(), StatsError> {
        self.begin_cycle().await?;
        self.refresh_user_totals().await?;
        self.refresh_view_totals().await?;
        Ok(())
    }

    /// The 12-point dashboard report over the stored series.
    #[instrument(skip(self))]
    pub async fn dashboard_report(&self) -> Result<DashboardReport, StatsError> {
        let newest_first = store::snapshots::recent(SERIES_LEN, &self.database)
            .await
            .context(FetchSeriesSnafu)?;

        Ok(build_report(newest_first))
    }
}
