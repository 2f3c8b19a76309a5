//! Status endpoint
//!
//! Runtime statistics: contribution counts by lifecycle state, integration
//! connectivity, and workflow inventory. Heavier than /health; meant for
//! operators and dashboards rather than load balancers.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::{arbor_error_response, json_response};
use crate::contribution::ContributionStore;
use crate::integrations::{ClientStats, Connectivity};
use crate::server::AppState;

/// Contribution store stats
#[derive(Debug, Serialize)]
pub struct ContributionStats {
    pub total: usize,
    pub by_state: HashMap<String, usize>,
}

/// Integration pool stats
#[derive(Debug, Serialize)]
pub struct IntegrationStats {
    pub configured: Vec<String>,
    pub connectivity: HashMap<String, Connectivity>,
    pub clients: HashMap<String, ClientStats>,
}

/// Workflow orchestrator stats
#[derive(Debug, Serialize)]
pub struct WorkflowStats {
    pub registered: Vec<String>,
    pub runs: usize,
}

/// Full status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub node_id: String,
    pub uptime_secs: u64,
    pub contributions: ContributionStats,
    pub integrations: IntegrationStats,
    pub workflows: WorkflowStats,
}

/// Handle GET /status
pub async fn status_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let by_state = match state.store.state_counts().await {
        Ok(counts) => counts,
        Err(e) => return arbor_error_response(&e),
    };
    let total = by_state.values().sum();

    let response = StatusResponse {
        node_id: state.args.node_id.to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        contributions: ContributionStats { total, by_state },
        integrations: IntegrationStats {
            configured: state.pool.names(),
            connectivity: state.pool.connectivity(),
            clients: state.pool.stats(),
        },
        workflows: WorkflowStats {
            registered: state.workflows.workflow_ids(),
            runs: state.workflows.run_count().await,
        },
    };

    json_response(StatusCode::OK, &response)
}
