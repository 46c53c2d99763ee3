//! Live change feeds driving the aggregator.
//!
//! The watcher owns the subscription lifecycle explicitly: [Watcher::start]
//! opens a live query per watched table and returns a [WatcherHandle] that
//! stops the background tasks. Tests drive the aggregator directly and
//! never need a live feed.

use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use futures::{pin_mut, Future, StreamExt};
use snafu::{Location, ResultExt as _, Snafu};
use surrealdb::{Action, Notification};

use crate::database::Database;
use crate::model::{Course, User};
use crate::stats::{Aggregator, StatsError};

#[derive(Debug, Snafu)]
pub enum WatcherSetupError {
    #[snafu(display("failed to subscribe for changes on the `{table}` table: {source}"))]
    Subscription {
        table: &'static str,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Clone, new)]
pub struct Watcher {
    pub aggregator: Arc<Aggregator>,
    pub database: Database,
}

impl Watcher {
    /// Begin watching the `users` and `courses` tables. Every change
    /// notification refreshes the matching totals on the current snapshot.
    pub async fn start(&self) -> Result<WatcherHandle, WatcherSetupError> {
        let users = self
            .database
            .select::<Vec<User>>(User::TABLE)
            .live()
            .into_owned()
            .await
            .context(SubscriptionSnafu { table: User::TABLE })?;

        let courses = self
            .database
            .select::<Vec<Course>>(Course::TABLE)
            .live()
            .into_owned()
            .await
            .context(SubscriptionSnafu {
                table: Course::TABLE,
            })?;

        let tasks = vec![
            spawn_feed(Feed::Users, users, self.aggregator.clone()),
            spawn_feed(Feed::Courses, courses, self.aggregator.clone()),
        ];

        tracing::info!("watching for user and course changes");
        Ok(WatcherHandle { tasks })
    }

    /// Append a fresh snapshot every `period`, rolling the series forward
    /// one aggregation cycle at a time.
    pub fn cycle(&self, period: Duration) -> WatcherTask {
        let aggregator = self.aggregator.clone();

        WatcherTask::spawn(move |mut quit| async move {
            let start = tokio::time::Instant::now() + period;
            let mut timer = tokio::time::interval_at(start, period);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(?period, "rolling the aggregation cycle on a timer");

            loop {
                tokio::select! {
                    _ = &mut quit => break,
                    _ = timer.tick() => {
                        if let Err(error) = aggregator.roll_cycle().await {
                            tracing::error!(%error, "failed to roll the aggregation cycle");
                        }
                    }
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Feed {
    Users,
    Courses,
}

impl Feed {
    fn table(self) -> &'static str {
        match self {
            Feed::Users => User::TABLE,
            Feed::Courses => Course::TABLE,
        }
    }

    async fn refresh(self, aggregator: &Aggregator) -> Result<(), StatsError> {
        match self {
            Feed::Users => aggregator.refresh_user_totals().await,
            Feed::Courses => aggregator.refresh_view_totals().await,
        }
    }
}

/// Run one change feed until it ends or the quit signal fires. A failed
/// refresh is logged and dropped: a missed update is corrected by the next
/// change on the table.
fn spawn_feed<S, T>(feed: Feed, stream: S, aggregator: Arc<Aggregator>) -> WatcherTask
where
    S: futures::Stream<Item = surrealdb::Result<Notification<T>>> + Send + 'static,
    T: Send,
{
    WatcherTask::spawn(move |mut quit| async move {
        pin_mut!(stream);

        loop {
            tokio::select! {
                _ = &mut quit => break,

                event = stream.next() => {
                    let Some(event) = event else {
                        tracing::warn!(table = feed.table(), "change feed ended");
                        break;
                    };

                    match event {
                        Ok(Notification { action, .. }) => {
                            if !matches!(action, Action::Create | Action::Update | Action::Delete) {
                                continue;
                            }
                        }
                        // a record we cannot decode still changed the table
                        Err(error) => {
                            tracing::warn!(%error, table = feed.table(), "malformed change event");
                        }
                    }

                    if let Err(error) = feed.refresh(&aggregator).await {
                        tracing::error!(%error, table = feed.table(), "failed to refresh totals");
                    }
                }
            }
        }
    })
}

#[derive(Debug, Clone, Copy)]
struct Quit;

type QuitSignal = tokio::sync::oneshot::Receiver<Quit>;

#[derive(Debug)]
pub struct WatcherTask {
    tx: tokio::sync::oneshot::Sender<Quit>,
    handle: tokio::task::JoinHandle<()>,
}

impl WatcherTask {
    fn spawn<F>(f: impl FnOnce(QuitSignal) -> F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = tokio::task::spawn(f(rx));
        Self { tx, handle }
    }

    pub fn quit(self) {
        let _ = self.tx.send(Quit);
    }

    pub async fn shutdown(self) {
        let _ = self.tx.send(Quit);
        let _ = self.handle.await;
    }
}

/// The running change-feed tasks. Dropping the handle leaves the tasks
/// running detached; call [WatcherHandle::stop] or [WatcherHandle::shutdown]
/// to end them.
#[derive(Debug)]
pub struct WatcherHandle {
    tasks: Vec<WatcherTask>,
}

impl WatcherHandle {
    pub fn stop(self) {
        for task in self.tasks {
            task.quit();
        }
    }

    pub async fn shutdown(self) {
        for task in self.tasks {
            task.shutdown().await;
        }
    }
}
