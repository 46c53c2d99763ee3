use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use derive_new::new;
use snafu::{Location, ResultExt as _, Snafu};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::stats::{Aggregator, DashboardReport, StatsError};

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(display("could not build the dashboard report: {source}"))]
    Dashboard {
        source: StatsError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");

        // report builds read from the store; a failure is retryable
        let status = match self {
            ApiError::Dashboard { .. } => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(serde_json::json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Clone, new)]
pub struct App {
    pub aggregator: Arc<Aggregator>,
}

pub fn create_app(aggregator: Arc<Aggregator>) -> App {
    App::new(aggregator)
}

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/api/v1/admin/stats", get(dashboard_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}

async fn dashboard_stats(State(app): State<App>) -> Result<Json<DashboardReport>> {
    let report = app
        .aggregator
        .dashboard_report()
        .await
        .context(DashboardSnafu)?;

    Ok(Json(report))
}
