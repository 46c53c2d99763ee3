//! Pure assembly of the dashboard report from a stored snapshot series.

use serde::{Deserialize, Serialize};

use crate::model::{Snapshot, Timestamp};

/// The dashboard always renders a fixed-width series, one point per
/// aggregation cycle.
pub const SERIES_LEN: usize = 12;

/// One point of the reported series. Placeholder points (before data
/// collection began) carry no timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub users: i64,
    pub subscriptions: i64,
    pub views: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl SeriesPoint {
    pub fn zero() -> Self {
        Self {
            users: 0,
            subscriptions: 0,
            views: 0,
            created_at: None,
        }
    }
}

impl From<Snapshot> for SeriesPoint {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            users: snapshot.users,
            subscriptions: snapshot.subscriptions,
            views: snapshot.views,
            created_at: Some(snapshot.created_at),
        }
    }
}

/// Left-pad a chronological series with zero placeholders until it is
/// `target` points long. Placeholders always precede the real points.
pub fn pad(series: Vec<SeriesPoint>, target: usize) -> Vec<SeriesPoint> {
    let missing = target.saturating_sub(series.len());

    let mut padded = Vec::with_capacity(missing + series.len());
    padded.extend(std::iter::repeat_with(SeriesPoint::zero).take(missing));
    padded.extend(series);
    padded
}

/// Period-over-period change for a single metric.
///
/// Growth from zero has no well-defined ratio; it is reported as
/// 100%-per-unit and always counts as a gain.
pub fn trend(previous: i64, current: i64) -> Trend {
    if previous == 0 {
        return Trend {
            percentage: (current * 100) as f64,
            profit: true,
        };
    }

    let percentage = (current - previous) as f64 / previous as f64 * 100.0;

    Trend {
        percentage,
        profit: percentage >= 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub percentage: f64,
    pub profit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub stats_data: Vec<SeriesPoint>,
    pub users_count: i64,
    pub subscriptions_count: i64,
    pub views_count: i64,
    pub users_percentage: f64,
    pub subscriptions_percentage: f64,
    pub views_percentage: f64,
    pub users_profit: bool,
    pub subscriptions_profit: bool,
    pub views_profit: bool,
}

/// Build the report from the stored series, `newest_first` as the snapshot
/// store returns it. The output series is always [SERIES_LEN] points long,
/// oldest to newest.
pub fn build_report(mut newest_first: Vec<Snapshot>) -> DashboardReport {
    newest_first.truncate(SERIES_LEN);

    let series: Vec<SeriesPoint> = newest_first.into_iter().rev().map(SeriesPoint::from).collect();
    let series = pad(series, SERIES_LEN);

    let current = series[SERIES_LEN - 1].clone();
    let previous = &series[SERIES_LEN - 2];

    let users = trend(previous.users, current.users);
    let subscriptions = trend(previous.subscriptions, current.subscriptions);
    let views = trend(previous.views, current.views);

    DashboardReport {
        users_count: current.users,
        subscriptions_count: current.subscriptions,
        views_count: current.views,
        users_percentage: users.percentage,
        subscriptions_percentage: subscriptions.percentage,
        views_percentage: views.percentage,
        users_profit: users.profit,
        subscriptions_profit: subscriptions.profit,
        views_profit: views.profit,
        stats_data: series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(users: i64, subscriptions: i64, views: i64) -> Snapshot {
        Snapshot::new(users, subscriptions, views)
    }

    #[test]
    fn pad_fills_up_to_target() {
        for stored in [0, 1, 5, 12] {
            let series = vec![SeriesPoint::from(snapshot(1, 1, 1)); stored];
            let padded = pad(series, SERIES_LEN);
            assert_eq!(padded.len(), SERIES_LEN);
        }
    }

    #[test]
    fn pad_keeps_placeholders_before_real_points() {
        let series = vec![SeriesPoint::from(snapshot(1, 1, 1)); 3];
        let padded = pad(series, SERIES_LEN);

        assert!(padded[..9].iter().all(|point| *point == SeriesPoint::zero()));
        assert!(padded[9..].iter().all(|point| point.users == 1));
    }

    #[test]
    fn pad_leaves_full_series_alone() {
        let series = vec![SeriesPoint::from(snapshot(1, 1, 1)); 12];
        assert_eq!(pad(series.clone(), SERIES_LEN), series);
    }

    #[test]
    fn growth_from_zero_is_hundred_percent_per_unit() {
        for current in [0, 1, 7, 42] {
            let trend = trend(0, current);
            assert_eq!(trend.percentage, (current * 100) as f64);
            assert!(trend.profit);
        }
    }

    #[test]
    fn growth_is_relative_to_previous_period() {
        let up = trend(10, 15);
        assert_eq!(up.percentage, 50.0);
        assert!(up.profit);

        let flat = trend(10, 10);
        assert_eq!(flat.percentage, 0.0);
        assert!(flat.profit);

        let down = trend(10, 5);
        assert_eq!(down.percentage, -50.0);
        assert!(!down.profit);
    }

    #[test]
    fn empty_store_reports_twelve_zero_points() {
        let report = build_report(vec![]);

        assert_eq!(report.stats_data.len(), SERIES_LEN);
        assert!(report.stats_data.iter().all(|p| *p == SeriesPoint::zero()));

        assert_eq!(report.users_percentage, 0.0);
        assert_eq!(report.subscriptions_percentage, 0.0);
        assert_eq!(report.views_percentage, 0.0);
        assert!(report.users_profit);
        assert!(report.subscriptions_profit);
        assert!(report.views_profit);
    }

    #[test]
    fn single_snapshot_compares_against_zero_padding() {
        let report = build_report(vec![snapshot(10, 2, 100)]);

        assert_eq!(report.stats_data.len(), SERIES_LEN);
        assert!(report.stats_data[..11]
            .iter()
            .all(|p| *p == SeriesPoint::zero()));

        assert_eq!(report.users_count, 10);
        assert_eq!(report.subscriptions_count, 2);
        assert_eq!(report.views_count, 100);

        assert_eq!(report.users_percentage, 1000.0);
        assert_eq!(report.subscriptions_percentage, 200.0);
        assert_eq!(report.views_percentage, 10_000.0);

        assert!(report.users_profit);
        assert!(report.subscriptions_profit);
        assert!(report.views_profit);
    }

    #[test]
    fn shrinking_metric_reports_a_loss() {
        // newest first: current has 5 users, previous had 10
        let report = build_report(vec![snapshot(5, 3, 70), snapshot(10, 2, 50)]);

        assert_eq!(report.users_percentage, -50.0);
        assert!(!report.users_profit);

        // each metric applies the rule independently
        assert_eq!(report.subscriptions_percentage, 50.0);
        assert!(report.subscriptions_profit);
        assert_eq!(report.views_percentage, 40.0);
        assert!(report.views_profit);
    }

    #[test]
    fn report_series_is_chronological() {
        let newest_first: Vec<Snapshot> = (0..5).map(|i| snapshot(5 - i, 0, 0)).collect();
        let report = build_report(newest_first);

        let users: Vec<i64> = report.stats_data.iter().map(|p| p.users).collect();
        assert_eq!(users, vec![0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn overlong_series_keeps_the_newest_points() {
        let newest_first: Vec<Snapshot> = (0..20).map(|i| snapshot(20 - i, 0, 0)).collect();
        let report = build_report(newest_first);

        assert_eq!(report.stats_data.len(), SERIES_LEN);
        assert_eq!(report.users_count, 20);
        assert_eq!(report.stats_data[0].users, 9);
    }
}
