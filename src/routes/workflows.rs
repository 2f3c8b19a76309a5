//! Workflow endpoints
//!
//! - `POST /api/v1/workflows/{id}/run`       - execute a workflow, returns the run record
//! - `GET  /api/v1/workflows/runs/{run_id}`  - fetch a retained run record

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::sync::Arc;

use super::{arbor_error_response, json_response};
use crate::server::AppState;

/// Handle POST /api/v1/workflows/{id}/run
pub async fn handle_workflow_run(state: Arc<AppState>, workflow_id: &str) -> Response<Full<Bytes>> {
    match state.workflows.run(workflow_id).await {
        Ok(run) => json_response(StatusCode::OK, &run),
        Err(e) => arbor_error_response(&e),
    }
}

/// Handle GET /api/v1/workflows/runs/{run_id}
pub async fn handle_workflow_status(state: Arc<AppState>, run_id: &str) -> Response<Full<Bytes>> {
    match state.workflows.status(run_id).await {
        Ok(run) => json_response(StatusCode::OK, &run),
        Err(e) => arbor_error_response(&e),
    }
}
