use std::sync::Arc;

use dotenvy::dotenv;
use snafu::ResultExt as _;

use abacus::config::Config;
use abacus::database::Database;
use abacus::error::{
    ApplicationError, BindAddressSnafu, ConfigLoadSnafu, ConnectDatabaseSnafu, SeedSnapshotSnafu,
    WatchChangesSnafu, WebServerSnafu,
};
use abacus::stats::Aggregator;
use abacus::watcher::Watcher;
use abacus::{api, logger};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env().context(ConfigLoadSnafu)?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.surreal)
        .await
        .context(ConnectDatabaseSnafu)?;

    let aggregator = Arc::new(Aggregator::new(database.clone()));

    // fail loudly at boot if the store cannot hold a snapshot
    aggregator
        .current_snapshot()
        .await
        .context(SeedSnapshotSnafu)?;

    let watcher = Watcher::new(aggregator.clone(), database);
    let feeds = watcher.start().await.context(WatchChangesSnafu)?;
    let cycle = watcher.cycle(config.cycle_interval());

    let app = api::create_app(aggregator);
    let router = api::create_router(app);

    let listener = tokio::net::TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!(address = %config.host, "serving dashboard statistics");
    axum::serve(listener, router).await.context(WebServerSnafu)?;

    feeds.shutdown().await;
    cycle.shutdown().await;

    Ok(())
}
