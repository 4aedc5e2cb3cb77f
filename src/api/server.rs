//! Axum HTTP server exposing project/task CRUD and schedule recalculation.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::ApiError;
use crate::db::{Database, DeletionPolicy};
use crate::schedule::Scheduler;
use crate::types::{Project, ProjectId, ProjectInput, Task, TaskId, TaskInput};

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    scheduler: Arc<Scheduler>,
    deletion_policy: DeletionPolicy,
}

impl AppState {
    pub fn new(db: Arc<Database>, scheduler: Arc<Scheduler>, deletion_policy: DeletionPolicy) -> Self {
        Self {
            db,
            scheduler,
            deletion_policy,
        }
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ----- Project endpoints -----

async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.db.list_projects()?))
}

async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.db.create_project(&input)?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Project>, ApiError> {
    let project = state.db.require_project_record(project_id)?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.db.update_project(project_id, &input)?))
}

async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_project(project_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- Task endpoints -----

async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.db.list_project_tasks(project_id)?))
}

async fn create_task(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(input): Json<TaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.db.create_task(project_id, &input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.db.get_task(project_id, task_id)?))
}

async fn update_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
    Json(input): Json<TaskInput>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.db.update_task(project_id, task_id, &input)?))
}

async fn delete_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(ProjectId, TaskId)>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .delete_task(project_id, task_id, state.deletion_policy)?;
    Ok(StatusCode::NO_CONTENT)
}

// ----- Recalculation -----

/// `POST /projects/{project_id}/recalculate-dates`
///
/// 204 on success; 409 on a dependency cycle or when another recalculation of
/// the same project is already in flight; 404 for an unknown project.
/// Persisted state is untouched on any failure.
async fn recalculate_dates(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, ApiError> {
    state
        .scheduler
        .try_recalculate_project_schedule(state.db.as_ref(), project_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    // Permissive CORS: the Angular dev server runs on another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/projects/{project_id}/tasks",
            get(list_tasks).post(create_task),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            "/projects/{project_id}/recalculate-dates",
            post(recalculate_dates),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and run the HTTP server. Blocks until the server exits.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("planboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
