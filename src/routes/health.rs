//! Health, readiness, version, and overview endpoints
//!
//! - `/`            - platform overview
//! - `/health(z)`   - liveness probe; always 200 while the process runs
//! - `/ready(z)`    - readiness probe; 503 while any dependency is unavailable
//! - `/version`     - build identification
//!
//! Health bodies carry a per-dependency connectivity map (the store plus
//! every configured integration client) so callers can distinguish "the
//! service is up" from "the service can reach its collaborators".

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::json_response;
use crate::integrations::Connectivity;
use crate::server::AppState;

/// Health response body
#[derive(Serialize)]
pub struct HealthResponse {
    /// True while the process is serving
    pub healthy: bool,
    /// "online" when every dependency is connected, otherwise "degraded"
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub node_id: String,
    pub mode: &'static str,
    pub timestamp: String,
    /// Per-dependency connectivity: store plus each integration client
    pub dependencies: HashMap<String, Connectivity>,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let mut dependencies = state.pool.connectivity();
    // The in-memory store has no remote to lose
    dependencies.insert("store".to_string(), Connectivity::Connected);

    let all_connected = dependencies
        .values()
        .all(|c| *c == Connectivity::Connected);

    HealthResponse {
        healthy: true,
        status: if all_connected { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        node_id: state.args.node_id.to_string(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        dependencies,
    }
}

/// Liveness probe (/health, /healthz)
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);
    json_response(StatusCode::OK, &response)
}

/// Readiness probe (/ready, /readyz)
///
/// Not ready while any dependency reports unavailable, unless dev mode is
/// on (integrations are optional there).
pub fn readiness_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = build_health_response(&state);

    let is_ready = state.args.dev_mode
        || response
            .dependencies
            .values()
            .all(|c| *c != Connectivity::Unavailable);

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    json_response(status, &response)
}

/// Build/version info for deployment verification
pub fn version_info() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "commit": option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
            "built_at": option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        }),
    )
}

/// Platform overview (GET /)
pub fn overview(state: Arc<AppState>) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &json!({
            "name": "Arbor",
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "status": "operational",
            "components": {
                "lifecycle": "contribution state machine: submit, process, verify, assess, sync, reward",
                "domains": state.dispatcher.domains(),
                "integrations": state.pool.names(),
                "workflows": state.workflows.workflow_ids(),
            },
            "api": "/api/v1",
        }),
    )
}
