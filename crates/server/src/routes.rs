//! REST surface for the approval workflow engine.
//!
//! Endpoints:
//! - `POST   /workflows`                    — create a workflow
//! - `GET    /workflows`                    — audit list, most recent first
//! - `GET    /workflows/{id}`               — fetch one workflow
//! - `PUT    /workflows/{id}`               — administrative partial update
//! - `PUT    /workflows/{id}/step/{step}`   — act on the active step
//! - `DELETE /workflows/{id}`               — hard delete
//! - `GET    /workflows/queue/{role}`       — an approver role's queue
//!
//! The caller's role claim arrives via the `x-approver-role` header,
//! validated upstream.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use quoteflow_core::domain::workflow::{
    StepUpdate, Workflow, WorkflowId, WorkflowPatch, WorkflowSpec,
};
use quoteflow_core::errors::WorkflowError;

use crate::service::WorkflowService;

pub const APPROVER_ROLE_HEADER: &str = "x-approver-role";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub workflow_id: WorkflowId,
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub workflow: Workflow,
}

#[derive(Debug, Serialize)]
pub struct WorkflowListResponse {
    pub workflows: Vec<Workflow>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub kind: &'static str,
    pub error: String,
}

type Rejection = (StatusCode, Json<ApiError>);

pub fn router(service: WorkflowService) -> Router {
    Router::new()
        .route("/workflows", post(create_workflow).get(list_workflows))
        .route("/workflows/queue/{role}", get(my_queue))
        .route(
            "/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/workflows/{id}/step/{step}", put(update_workflow_step))
        .with_state(service)
}

async fn create_workflow(
    State(service): State<WorkflowService>,
    Json(spec): Json<WorkflowSpec>,
) -> Result<(StatusCode, Json<CreatedResponse>), Rejection> {
    let workflow = service.create_workflow(spec).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { workflow_id: workflow.id })))
}

async fn list_workflows(
    State(service): State<WorkflowService>,
) -> Result<Json<WorkflowListResponse>, Rejection> {
    let workflows = service.list_workflows().await.map_err(reject)?;
    Ok(Json(WorkflowListResponse { workflows }))
}

async fn get_workflow(
    State(service): State<WorkflowService>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowResponse>, Rejection> {
    let workflow = service.get_workflow(&WorkflowId(id)).await.map_err(reject)?;
    Ok(Json(WorkflowResponse { workflow }))
}

async fn update_workflow(
    State(service): State<WorkflowService>,
    Path(id): Path<String>,
    Json(patch): Json<WorkflowPatch>,
) -> Result<Json<WorkflowResponse>, Rejection> {
    let workflow = service.update_workflow(&WorkflowId(id), patch).await.map_err(reject)?;
    Ok(Json(WorkflowResponse { workflow }))
}

async fn update_workflow_step(
    State(service): State<WorkflowService>,
    Path((id, step)): Path<(String, u32)>,
    headers: HeaderMap,
    Json(update): Json<StepUpdate>,
) -> Result<Json<WorkflowResponse>, Rejection> {
    let actor_role = approver_role(&headers)?;
    let workflow = service
        .update_workflow_step(&WorkflowId(id), step, &actor_role, update)
        .await
        .map_err(reject)?;
    Ok(Json(WorkflowResponse { workflow }))
}

async fn delete_workflow(
    State(service): State<WorkflowService>,
    Path(id): Path<String>,
) -> Result<StatusCode, Rejection> {
    service.delete_workflow(&WorkflowId(id)).await.map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn my_queue(
    State(service): State<WorkflowService>,
    Path(role): Path<String>,
) -> Result<Json<WorkflowListResponse>, Rejection> {
    let workflows = service.my_queue(&role).await.map_err(reject)?;
    Ok(Json(WorkflowListResponse { workflows }))
}

fn approver_role(headers: &HeaderMap) -> Result<String, Rejection> {
    let role = headers
        .get(APPROVER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match role {
        Some(role) => Ok(role.to_string()),
        None => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                kind: "missing_role",
                error: format!("the `{APPROVER_ROLE_HEADER}` header is required"),
            }),
        )),
    }
}

fn reject(workflow_error: WorkflowError) -> Rejection {
    let status = match &workflow_error {
        WorkflowError::InvalidSpec(_) => StatusCode::BAD_REQUEST,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::RoleMismatch { .. }
        | WorkflowError::Transition(_)
        | WorkflowError::ConcurrentModification(_) => StatusCode::CONFLICT,
        WorkflowError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    if workflow_error.is_transient() {
        error!(
            event_name = "workflow.store_failure",
            error = %workflow_error,
            "store failure surfaced to caller"
        );
    }

    (status, Json(ApiError { kind: workflow_error.kind(), error: workflow_error.to_string() }))
}
