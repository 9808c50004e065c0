use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rehab_discharge::config::ConfigError;
use rehab_discharge::error::AppError;
use rehab_discharge::workflows::discharge::{
    discharge_router, select_work_items, CaseMutations, DischargeWorker, IntakeRules,
    PathwayStore, TrackingSink, WorkItem,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct QueueRequest {
    pub(crate) activities: Vec<Value>,
    /// References already on the queue.
    #[serde(default)]
    pub(crate) queued: Vec<String>,
    #[serde(default)]
    pub(crate) now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) lookback_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueueResponse {
    pub(crate) considered: usize,
    pub(crate) selected: Vec<WorkItem>,
}

pub(crate) fn with_discharge_routes<S, M, T>(
    worker: Arc<DischargeWorker<S, M, T>>,
) -> axum::Router
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    discharge_router(worker)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/discharge/queue", post(queue_endpoint))
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    };

    (status, Json(json!({ "status": label })))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Preview which activities the next queue run would pick up.
pub(crate) async fn queue_endpoint(
    Json(request): Json<QueueRequest>,
) -> Result<Json<QueueResponse>, AppError> {
    let QueueRequest {
        activities,
        queued,
        now,
        lookback_days,
    } = request;

    let rules = match lookback_days {
        Some(days) if days <= 0 => {
            return Err(AppError::Config(ConfigError::InvalidLookback))
        }
        Some(days) => IntakeRules::with_lookback_days(days),
        None => IntakeRules::standard(),
    };
    let queued: HashSet<String> = queued.into_iter().collect();
    let selected = select_work_items(
        &activities,
        now.unwrap_or_else(Utc::now),
        &rules,
        |reference| queued.contains(reference),
    );

    Ok(Json(QueueResponse {
        considered: activities.len(),
        selected,
    }))
}
