//! HTTP API module.
//!
//! Serves recommendations, assignments and workload listings over JSON.

mod server;

pub use server::{
    ApiError, ApiResult, ApiState, Envelope, HealthResponse, SearchQuery, ServerHandle,
    WorkloadQuery, assign, assign_to, build_router, complete, employee_workload, health,
    important_candidates, important_tasks, recommendation, reconcile, start_server,
};
