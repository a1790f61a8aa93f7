use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use site_schedule::{RefreshSummary, Relation, TaskId};

use crate::{
    CostItem, CostItemId, EngineError, EvmMetrics, LinkChange, ProjectSession, ProjectSnapshot,
    RecomputeOutput, recompute,
};

#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<ProjectSession>>,
}

impl AppState {
    pub fn new(session: ProjectSession) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }

    fn session(&self) -> Arc<RwLock<ProjectSession>> {
        self.session.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        warn!("request rejected: {err}");
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_conflict() {
            ApiError::Conflict(err.to_string())
        } else {
            ApiError::Invalid(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct LinkPayload {
    cost_item_id: CostItemId,
    task_id: TaskId,
}

#[derive(Debug, Serialize)]
struct LinkResponse {
    changed: bool,
    cost_item: Option<CostItem>,
    summary: RefreshSummary,
}

#[derive(Debug, Serialize)]
struct UnlinkResponse {
    cost_item_id: CostItemId,
    previous_task_id: Option<TaskId>,
}

#[derive(Debug, Serialize)]
struct EvmResponse {
    project: EvmMetrics,
    tasks: BTreeMap<TaskId, EvmMetrics>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(get_snapshot).put(put_snapshot))
        .route("/recompute", post(recompute_snapshot))
        .route("/refresh", post(refresh))
        .route("/relations", post(add_relation))
        .route("/relations/:pred/:succ", delete(remove_relation))
        .route("/links", post(link_cost_item))
        .route("/links/:item", delete(unlink_cost_item))
        .route("/critical-path", get(critical_path))
        .route("/evm", get(evm))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, session: ProjectSession) -> std::io::Result<()> {
    let app = router(AppState::new(session));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_snapshot(State(state): State<AppState>) -> Json<RecomputeOutput> {
    let session = state.session();
    let output = session.read().output().clone();
    Json(output)
}

async fn put_snapshot(
    State(state): State<AppState>,
    Json(snapshot): Json<ProjectSnapshot>,
) -> Result<Json<RecomputeOutput>, ApiError> {
    let session = state.session();
    let mut guard = session.write();
    guard.replace_snapshot(snapshot)?;
    Ok(Json(guard.output().clone()))
}

// Stateless: the stored session is not touched.
async fn recompute_snapshot(
    Json(snapshot): Json<ProjectSnapshot>,
) -> Result<Json<RecomputeOutput>, ApiError> {
    Ok(Json(recompute(&snapshot)?))
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshSummary>, ApiError> {
    let session = state.session();
    let mut guard = session.write();
    let summary = guard.refresh()?.summary();
    Ok(Json(summary))
}

async fn add_relation(
    State(state): State<AppState>,
    Json(relation): Json<Relation>,
) -> Result<(StatusCode, Json<RefreshSummary>), ApiError> {
    let session = state.session();
    let mut guard = session.write();
    guard.add_relation(relation)?;
    Ok((StatusCode::CREATED, Json(guard.output().summary())))
}

async fn remove_relation(
    State(state): State<AppState>,
    Path((pred, succ)): Path<(TaskId, TaskId)>,
) -> Result<StatusCode, ApiError> {
    let session = state.session();
    let removed = session.write().remove_relation(pred, succ)?;
    match removed {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::not_found(format!(
            "no relation from task {pred} to task {succ}"
        ))),
    }
}

async fn link_cost_item(
    State(state): State<AppState>,
    Json(payload): Json<LinkPayload>,
) -> Result<Json<LinkResponse>, ApiError> {
    let session = state.session();
    let mut guard = session.write();
    let change = guard.link(payload.cost_item_id, payload.task_id)?;
    let output = guard.output();
    Ok(Json(LinkResponse {
        changed: change == LinkChange::Linked,
        cost_item: output.cost_item(payload.cost_item_id).cloned(),
        summary: output.summary(),
    }))
}

async fn unlink_cost_item(
    State(state): State<AppState>,
    Path(cost_item_id): Path<CostItemId>,
) -> Result<Json<UnlinkResponse>, ApiError> {
    let session = state.session();
    let previous_task_id = session.write().unlink(cost_item_id)?;
    Ok(Json(UnlinkResponse {
        cost_item_id,
        previous_task_id,
    }))
}

async fn critical_path(State(state): State<AppState>) -> Json<Vec<TaskId>> {
    let session = state.session();
    let path = session.read().output().critical_path.sequence().to_vec();
    Json(path)
}

async fn evm(State(state): State<AppState>) -> Json<EvmResponse> {
    let session = state.session();
    let guard = session.read();
    let output = guard.output();
    Json(EvmResponse {
        project: output.project_metrics,
        tasks: output.task_metrics.clone(),
    })
}
