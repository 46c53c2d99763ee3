//! The dashboard route end to end, on an in-memory database.

use std::sync::Arc;

use axum_test::TestServer;
use url::Url;

use abacus::api;
use abacus::config::SurrealConfig;
use abacus::database::Database;
use abacus::model::Snapshot;
use abacus::stats::Aggregator;
use abacus::store;

async fn test_database() -> Database {
    let config = SurrealConfig {
        endpoint: Url::parse("mem://").unwrap(),
        namespace: "abacus".to_string(),
        database: "test".to_string(),
        username: None,
        password: None,
    };

    Database::connect(&config).await.unwrap()
}

#[tokio::test]
async fn dashboard_stats_returns_the_report() {
    let db = test_database().await;
    let aggregator = Arc::new(Aggregator::new(db.clone()));

    store::snapshots::append(Snapshot::new(10, 2, 100), &db)
        .await
        .unwrap();

    let router = api::create_router(api::create_app(aggregator));
    let server = TestServer::new(router).unwrap();

    let response = server.get("/api/v1/admin/stats").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    assert_eq!(body["statsData"].as_array().unwrap().len(), 12);
    assert_eq!(body["usersCount"], 10);
    assert_eq!(body["subscriptionsCount"], 2);
    assert_eq!(body["viewsCount"], 100);
    assert_eq!(body["usersPercentage"], 1000.0);
    assert_eq!(body["subscriptionsPercentage"], 200.0);
    assert_eq!(body["viewsPercentage"], 10_000.0);
    assert_eq!(body["usersProfit"], true);
    assert_eq!(body["subscriptionsProfit"], true);
    assert_eq!(body["viewsProfit"], true);

    // zero placeholders carry no timestamp
    let first = &body["statsData"][0];
    assert_eq!(first["users"], 0);
    assert!(first.get("createdAt").is_none());
}

#[tokio::test]
async fn dashboard_stats_on_an_empty_store() {
    let db = test_database().await;
    let aggregator = Arc::new(Aggregator::new(db.clone()));

    let router = api::create_router(api::create_app(aggregator));
    let server = TestServer::new(router).unwrap();

    let response = server.get("/api/v1/admin/stats").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    assert_eq!(body["statsData"].as_array().unwrap().len(), 12);
    assert_eq!(body["usersCount"], 0);
    assert_eq!(body["usersPercentage"], 0.0);
    assert_eq!(body["usersProfit"], true);
}
