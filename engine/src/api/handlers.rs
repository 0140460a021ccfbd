//! HTTP handlers
//!
//! Every handler takes the registry lock at most once per mutation and
//! converts entities to views before releasing it. LLM-backed handlers
//! delegate to the [`Conductor`](crate::conductor::Conductor), which manages
//! the lock itself.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sdk::errors::ConductorError;
use sdk::task::{NewTask, TaskId};
use sdk::worker::{NewWorker, WorkerId};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::error::ApiError;
use super::types::{
    AssignAllResponse, AssignRequest, AssignResponse, CompleteRequest, CompleteResponse,
    OrganizationStateResponse, OrganizationView, TaskView, UpdateSkillsRequest, WorkerView,
};
use super::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Decode an optional JSON body; an empty body yields the default
fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Conductor API",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT_HASH"),
    }))
}

/// GET /organization
pub async fn get_organization(State(state): State<AppState>) -> Json<OrganizationView> {
    let org = state.organization.lock().await;
    Json(OrganizationView::new(&org, Utc::now()))
}

/// GET /organization-state
pub async fn get_organization_state(
    State(state): State<AppState>,
) -> Json<OrganizationStateResponse> {
    let org = state.organization.lock().await;
    Json(OrganizationStateResponse {
        organization_state: org.state_report(Utc::now()),
    })
}

/// GET /workers
pub async fn list_workers(State(state): State<AppState>) -> Json<Vec<WorkerView>> {
    let org = state.organization.lock().await;
    Json(org.workers().map(|w| WorkerView::new(w, &org)).collect())
}

/// POST /workers
pub async fn create_worker(
    State(state): State<AppState>,
    body: Result<Json<NewWorker>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WorkerView>)> {
    let Json(new) = body?;
    let mut org = state.organization.lock().await;
    let worker = org.add_worker(new)?.clone();
    Ok((StatusCode::CREATED, Json(WorkerView::new(&worker, &org))))
}

/// GET /workers/:id
pub async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<WorkerView>> {
    let org = state.organization.lock().await;
    let worker = org.worker(WorkerId(id))?;
    Ok(Json(WorkerView::new(worker, &org)))
}

/// PUT /workers/:id/skills
pub async fn update_worker_skills(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<UpdateSkillsRequest>, JsonRejection>,
) -> ApiResult<Json<WorkerView>> {
    let Json(request) = body?;
    let mut org = state.organization.lock().await;
    let worker = org.update_worker_skills(WorkerId(id), request.skills)?.clone();
    Ok(Json(WorkerView::new(&worker, &org)))
}

/// GET /tasks
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskView>> {
    let org = state.organization.lock().await;
    let now = Utc::now();
    Json(org.tasks().map(|t| TaskView::new(t, now)).collect())
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let Json(new) = body?;
    let mut org = state.organization.lock().await;
    let now = Utc::now();
    let task = org.add_task(new, now)?;
    Ok((StatusCode::CREATED, Json(TaskView::new(task, now))))
}

/// GET /tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<TaskView>> {
    let org = state.organization.lock().await;
    let task = org.task(TaskId(id))?;
    Ok(Json(TaskView::new(task, Utc::now())))
}

/// GET /completed-tasks
pub async fn list_completed_tasks(State(state): State<AppState>) -> Json<Vec<TaskView>> {
    let org = state.organization.lock().await;
    let now = Utc::now();
    Json(
        org.completed_tasks()
            .iter()
            .map(|t| TaskView::new(t, now))
            .collect(),
    )
}

/// POST /tasks/new-assign
pub async fn create_and_assign_task(
    State(state): State<AppState>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AssignResponse>)> {
    let Json(new) = body?;
    let (task, outcome) = state.conductor.create_and_assign(new).await?;
    let response = assign_response(&state, task.id, Some(outcome)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /tasks/:id/assign
///
/// `{"worker_name": "..."}` assigns directly; an empty body asks the model.
pub async fn assign_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> ApiResult<Json<AssignResponse>> {
    let request: AssignRequest = optional_body(&body)?;
    let task_id = TaskId(id);

    let outcome = match request.worker_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            let mut org = state.organization.lock().await;
            org.assign_manually(task_id, name, Utc::now())?;
            None
        }
        _ => {
            // Missing, archived and blocked tasks are errors here, not warnings
            {
                let org = state.organization.lock().await;
                let task = org.task(task_id)?;
                if org.is_archived(task_id) {
                    return Err(ConductorError::AlreadyCompleted(task_id).into());
                }
                if !org.dependencies_met(task) {
                    return Err(ConductorError::TaskBlocked(task_id).into());
                }
            }
            Some(state.conductor.assign(&[task_id]).await?)
        }
    };

    Ok(Json(assign_response(&state, task_id, outcome).await?))
}

/// POST /tasks/assign
pub async fn assign_all_tasks(
    State(state): State<AppState>,
) -> ApiResult<Json<AssignAllResponse>> {
    let outcome = state.conductor.assign_all().await?;

    let org = state.organization.lock().await;
    let now = Utc::now();
    Ok(Json(AssignAllResponse {
        outcome,
        tasks: org.tasks().map(|t| TaskView::new(t, now)).collect(),
    }))
}

/// POST /tasks/:id/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> ApiResult<Json<CompleteResponse>> {
    let request: CompleteRequest = optional_body(&body)?;

    let mut org = state.organization.lock().await;
    let now = Utc::now();
    let completion = org.complete_task(TaskId(id), request.feedback, now)?;

    Ok(Json(CompleteResponse {
        task: TaskView::new(&completion.task, now),
        worker: completion
            .worker
            .as_ref()
            .map(|worker| WorkerView::new(worker, &org)),
        unblocked: completion.unblocked,
    }))
}

async fn assign_response(
    state: &AppState,
    task_id: TaskId,
    outcome: Option<crate::conductor::AssignmentOutcome>,
) -> ApiResult<AssignResponse> {
    let org = state.organization.lock().await;
    let task = org.task(task_id)?;
    let worker = task
        .assigned_worker
        .as_deref()
        .and_then(|name| org.worker_by_name(name).ok())
        .map(|worker| WorkerView::new(worker, &org));

    Ok(AssignResponse {
        task: TaskView::new(task, Utc::now()),
        worker,
        outcome,
    })
}
