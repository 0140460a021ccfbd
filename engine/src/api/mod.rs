//! HTTP API
//!
//! REST endpoints over the shared organization registry and the assignment
//! orchestrator.
//!
//! # Endpoints
//!
//! - GET  /                      - Welcome message and build info
//! - GET  /organization          - Workers, active and completed tasks
//! - GET  /organization-state    - Text report
//! - GET  /workers, POST /workers
//! - GET  /workers/:id, PUT /workers/:id/skills
//! - GET  /tasks, POST /tasks
//! - GET  /tasks/:id
//! - POST /tasks/new-assign      - Create a task and let the model assign it
//! - POST /tasks/:id/assign      - Manual (`worker_name`) or model assignment
//! - POST /tasks/assign          - Model assignment of every unassigned task
//! - POST /tasks/:id/complete    - Complete with optional feedback
//! - GET  /completed-tasks

pub mod error;
pub mod handlers;
pub mod types;

pub use error::ApiError;

use axum::{
    routing::{get, post, put},
    Router,
};
use sdk::errors::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::conductor::Conductor;
use crate::organization::OrganizationHandle;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub organization: OrganizationHandle,
    pub conductor: Arc<Conductor>,
}

impl AppState {
    pub fn new(conductor: Arc<Conductor>) -> Self {
        Self {
            organization: conductor.organization().clone(),
            conductor,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/organization", get(handlers::get_organization))
        .route("/organization-state", get(handlers::get_organization_state))
        .route(
            "/workers",
            get(handlers::list_workers).post(handlers::create_worker),
        )
        .route("/workers/:id", get(handlers::get_worker))
        .route("/workers/:id/skills", put(handlers::update_worker_skills))
        .route(
            "/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/tasks/new-assign", post(handlers::create_and_assign_task))
        .route("/tasks/assign", post(handlers::assign_all_tasks))
        .route("/tasks/:id", get(handlers::get_task))
        .route("/tasks/:id/assign", post(handlers::assign_task))
        .route("/tasks/:id/complete", post(handlers::complete_task))
        .route("/completed-tasks", get(handlers::list_completed_tasks))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("API server listening on http://{}", local_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("API server shutting down gracefully");
        })
        .await?;

    Ok(())
}
