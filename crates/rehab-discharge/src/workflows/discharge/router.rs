use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use super::gateway::{CaseMutations, PathwayStore, TrackingSink};
use super::worker::{DischargeWorker, WorkItem, WorkItemStatus};

/// Work item submitted over HTTP; `reference` defaults to the payload's `id`.
#[derive(Debug, Deserialize)]
pub struct WorkItemRequest {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
    pub data: Value,
}

impl WorkItemRequest {
    fn into_work_item(self) -> (WorkItem, Option<NaiveDate>) {
        let reference = self.reference.unwrap_or_else(|| match self.data.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        });
        let item = WorkItem {
            reference,
            data: self.data,
        };
        (item, self.today)
    }
}

/// Router exposing work-item processing for the discharge worker.
pub fn discharge_router<S, M, T>(worker: Arc<DischargeWorker<S, M, T>>) -> Router
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/discharge/work-items",
            post(process_handler::<S, M, T>),
        )
        .route("/api/v1/discharge/results", get(results_handler::<S, M, T>))
        .with_state(worker)
}

pub(crate) async fn process_handler<S, M, T>(
    State(worker): State<Arc<DischargeWorker<S, M, T>>>,
    axum::Json(request): axum::Json<WorkItemRequest>,
) -> Response
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    let (item, today) = request.into_work_item();
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let result = worker.process_item(&item, today);

    let status = match result.status {
        WorkItemStatus::Completed => StatusCode::OK,
        WorkItemStatus::Failed => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, axum::Json(result)).into_response()
}

pub(crate) async fn results_handler<S, M, T>(
    State(worker): State<Arc<DischargeWorker<S, M, T>>>,
) -> Response
where
    S: PathwayStore + 'static,
    M: CaseMutations + 'static,
    T: TrackingSink + 'static,
{
    let results = worker.results();
    let payload = json!({
        "processed": results.len(),
        "results": results,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
