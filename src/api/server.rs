//! HTTP server implementation for the assignment API.
//!
//! Every response uses the `{status, data, details}` envelope. Store work runs
//! on the blocking pool since the SQLite connection is synchronous.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::assign::Assigner;
use crate::config::Config;
use crate::db::Database;
use crate::error::{AssignError, ErrorBody, ErrorCode};
use crate::types::{
    AssignOutcome, Assignment, Decision, EmployeeId, EmployeeWorkload, ImportantCandidate,
    ImportantTask, Task, TaskId, WorkloadDrift,
};

/// State shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    db: Database,
    assigner: Arc<Assigner<Database>>,
    listing_limit: usize,
}

impl ApiState {
    pub fn new(db: Database, config: &Config) -> Self {
        let assigner = Arc::new(Assigner::new(db.clone(), &config.assignment));
        Self {
            db,
            assigner,
            listing_limit: config.server.listing_limit,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// Response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub data: Option<T>,
    pub details: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data: Some(data),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Handler error carrying the core error through to the response.
#[derive(Debug)]
pub struct ApiError(pub AssignError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self.0.code() {
            ErrorCode::EmployeeNotFound | ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::NoEmployees => StatusCode::CONFLICT,
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,
            ErrorCode::TooManyRows => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AssignError> for ApiError {
    fn from(err: AssignError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), error = %self.0, "Request failed");
        let body = Envelope {
            status: "error",
            data: Some(ErrorBody::from(&self.0)),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Run synchronous store work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AssignError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Preview who should take a task.
pub async fn recommendation(
    State(state): State<ApiState>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Decision> {
    let assigner = Arc::clone(&state.assigner);
    let decision = blocking(move || assigner.recommend(task_id)).await?;
    let details = decision.justification.describe();
    Ok(Json(Envelope::success(decision).with_details(details)))
}

/// Decide and commit an assignment.
pub async fn assign(
    State(state): State<ApiState>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<AssignOutcome> {
    let assigner = Arc::clone(&state.assigner);
    let outcome = blocking(move || assigner.assign(task_id)).await?;
    let details = outcome.decision.justification.describe();
    Ok(Json(Envelope::success(outcome).with_details(details)))
}

/// Assign a task to a named employee, bypassing the policy.
pub async fn assign_to(
    State(state): State<ApiState>,
    Path((task_id, employee_id)): Path<(TaskId, EmployeeId)>,
) -> ApiResult<Assignment> {
    let assigner = Arc::clone(&state.assigner);
    let assignment = blocking(move || assigner.assign_to(task_id, employee_id)).await?;
    Ok(Json(Envelope::success(assignment).with_details("assigned")))
}

/// Mark a task completed.
pub async fn complete(
    State(state): State<ApiState>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<Task> {
    let db = state.db.clone();
    let task = blocking(move || db.complete_task(task_id)).await?;
    Ok(Json(Envelope::success(task).with_details("completed")))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

/// Unassigned tasks that in-flight subtasks depend on.
pub async fn important_tasks(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<ImportantTask>> {
    let db = state.db.clone();
    let limit = state.listing_limit;
    let tasks = blocking(move || db.important_tasks(&query.search, limit)).await?;
    Ok(Json(important_envelope(tasks)))
}

/// Important tasks with the employee recommended for each.
pub async fn important_candidates(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<ImportantCandidate>> {
    let assigner = Arc::clone(&state.assigner);
    let limit = state.listing_limit;
    let candidates =
        blocking(move || assigner.important_candidates(&query.search, limit)).await?;
    Ok(Json(important_envelope(candidates)))
}

fn important_envelope<T>(items: Vec<T>) -> Envelope<Vec<T>> {
    if items.is_empty() {
        Envelope::success(items).with_details("no important tasks")
    } else {
        Envelope::success(items)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkloadQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub task: String,
}

/// Employees with their open tasks, lightest first.
pub async fn employee_workload(
    State(state): State<ApiState>,
    Query(query): Query<WorkloadQuery>,
) -> ApiResult<Vec<EmployeeWorkload>> {
    let db = state.db.clone();
    let limit = state.listing_limit;
    let workload = blocking(move || db.employees_with_tasks(&query.name, &query.task, limit)).await?;
    Ok(Json(Envelope::success(workload)))
}

/// Recompute workload counters.
pub async fn reconcile(State(state): State<ApiState>) -> ApiResult<Vec<WorkloadDrift>> {
    let db = state.db.clone();
    let drift = blocking(move || db.reconcile_workloads()).await?;
    let details = format!("{} counter(s) corrected", drift.len());
    Ok(Json(Envelope::success(drift).with_details(details)))
}

/// Build the router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks/important", get(important_tasks))
        .route("/api/tasks/important/candidates", get(important_candidates))
        .route("/api/tasks/{task_id}/recommendation", get(recommendation))
        .route("/api/tasks/{task_id}/assign", post(assign))
        .route("/api/tasks/{task_id}/assign/{employee_id}", post(assign_to))
        .route("/api/tasks/{task_id}/complete", post(complete))
        .route("/api/employees/workload", get(employee_workload))
        .route("/api/employees/reconcile", post(reconcile))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Handle to a running server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

/// Bind and start serving in the background.
pub async fn start_server(state: ApiState, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_http_status() {
        let cases = [
            (AssignError::task_not_found(1), StatusCode::NOT_FOUND),
            (AssignError::employee_not_found(1), StatusCode::NOT_FOUND),
            (AssignError::NoEmployees, StatusCode::CONFLICT),
            (AssignError::invalid("x"), StatusCode::BAD_REQUEST),
            (AssignError::TooManyRows { limit: 5 }, StatusCode::UNPROCESSABLE_ENTITY),
            (AssignError::StoreUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AssignError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code(), status);
        }
    }

    #[test]
    fn envelope_serializes_with_details() {
        let env = Envelope::success(vec![1, 2]).with_details("two");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["details"], "two");
    }
}
