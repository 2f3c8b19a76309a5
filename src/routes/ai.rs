//! AI endpoints
//!
//! - `POST /api/v1/ai/risk-assessment` - standalone risk assessment
//! - `POST /api/v1/ai/query`           - passthrough to the AI-query integration
//!
//! Risk assessment is computed locally by the installed assessor strategy
//! and touches no stored contribution.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{arbor_error_response, json_response, read_json_body};
use crate::scoring::RiskAssessor;
use crate::server::AppState;

/// Request body for risk assessment
#[derive(Debug, Deserialize)]
pub struct RiskRequest {
    pub payload: Value,
    #[serde(default)]
    pub context: String,
}

/// Request body for AI queries
#[derive(Debug, Deserialize)]
pub struct AiQueryRequest {
    pub query: String,
}

/// Handle POST /api/v1/ai/risk-assessment
pub async fn handle_risk_assessment(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let body: RiskRequest = match read_json_body(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let assessment = state.assessor.assess(&body.payload, &body.context);
    json_response(StatusCode::OK, &assessment)
}

/// Handle POST /api/v1/ai/query
pub async fn handle_ai_query(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let body: AiQueryRequest = match read_json_body(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match state.pool.query("ai-query", &body.query).await {
        Ok(reply) => json_response(StatusCode::OK, &reply),
        Err(e) => arbor_error_response(&e),
    }
}
