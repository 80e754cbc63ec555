// src/api.rs
use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::aggregate::AggregateResult;
use crate::engine::{Monitor, RefreshOutcome};
use crate::record::ClassifiedRecord;
use crate::scheduler::RefreshState;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/snapshot", get(snapshot))
        .route("/aggregate", get(aggregate))
        .route("/refresh", post(refresh))
        .route("/debug/refresh-state", get(debug_refresh_state))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn snapshot(State(state): State<AppState>) -> Json<Vec<ClassifiedRecord>> {
    Json(state.monitor.snapshot())
}

#[derive(serde::Serialize)]
struct AggregateOut {
    status: &'static str,
    #[serde(flatten)]
    result: Option<AggregateResult>,
}

async fn aggregate(State(state): State<AppState>) -> Json<AggregateOut> {
    let out = match state.monitor.aggregate() {
        Some(result) => AggregateOut {
            status: "ready",
            result: Some(result),
        },
        // Distinct from a zero mean: an empty store has nothing to report.
        None => AggregateOut {
            status: "no_data",
            result: None,
        },
    };
    Json(out)
}

#[derive(serde::Deserialize, Default)]
struct RefreshParams {
    #[serde(default)]
    force: bool,
}

async fn refresh(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<RefreshOutcome>, (StatusCode, String)> {
    match state.monitor.request_refresh(params.force).await {
        Ok(outcome) => Ok(Json(outcome)),
        // Storage write failures are the only fatal-for-this-cycle path.
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("persist failed: {e:#}"),
        )),
    }
}

async fn debug_refresh_state(State(state): State<AppState>) -> Json<RefreshState> {
    Json(state.monitor.refresh_state().await)
}
