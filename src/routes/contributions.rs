//! Contribution endpoints
//!
//! - `POST /api/v1/contributions`               - submit
//! - `GET  /api/v1/contributions/{id}`          - fetch
//! - `POST /api/v1/contributions/{id}/advance`  - advance one lifecycle step
//! - `GET  /api/v1/contributions/{id}/verify`   - force re-verification
//! - `GET  /api/v1/users/{id}/dashboard`        - per-user dashboard
//!
//! A contribution that reached `FAILED` is still a 200 from `advance` — the
//! body carries the state and the originating error kind; the failure is
//! data, not a transport error.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{arbor_error_response, error_response, json_response, read_json_body};
use crate::contribution::{Contribution, ContributionId, LifecycleState};
use crate::server::AppState;

/// Request body for submissions
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_domain() -> String {
    "general".to_string()
}

/// Per-user dashboard body
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user_id: String,
    pub contributions: Vec<Contribution>,
    pub total_rewards: f64,
    pub verified: usize,
    pub rejected: usize,
}

fn parse_id(raw: &str) -> Result<ContributionId, Response<Full<Bytes>>> {
    ContributionId::parse(raw).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("malformed contribution id: {}", raw),
            "validation",
        )
    })
}

/// Handle POST /api/v1/contributions
pub async fn handle_submit(state: Arc<AppState>, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let body: SubmitRequest = match read_json_body(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    let id = match state
        .engine
        .submit(&body.user_id, &body.title, &body.content, &body.domain)
        .await
    {
        Ok(id) => id,
        Err(e) => return arbor_error_response(&e),
    };

    match state.engine.get(&id).await {
        Ok(contribution) => json_response(StatusCode::CREATED, &contribution),
        Err(e) => arbor_error_response(&e),
    }
}

/// Handle GET /api/v1/contributions/{id}
pub async fn handle_get_contribution(state: Arc<AppState>, raw_id: &str) -> Response<Full<Bytes>> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.engine.get(&id).await {
        Ok(contribution) => json_response(StatusCode::OK, &contribution),
        Err(e) => arbor_error_response(&e),
    }
}

/// Handle POST /api/v1/contributions/{id}/advance
pub async fn handle_advance(state: Arc<AppState>, raw_id: &str) -> Response<Full<Bytes>> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.engine.advance(&id).await {
        Ok(contribution) => json_response(StatusCode::OK, &contribution),
        Err(e) => arbor_error_response(&e),
    }
}

/// Handle GET /api/v1/contributions/{id}/verify
pub async fn handle_verify(state: Arc<AppState>, raw_id: &str) -> Response<Full<Bytes>> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.engine.verify(&id).await {
        Ok(outcome) => json_response(StatusCode::OK, &outcome),
        Err(e) => arbor_error_response(&e),
    }
}

/// Handle GET /api/v1/users/{id}/dashboard
pub async fn handle_dashboard(state: Arc<AppState>, user_id: &str) -> Response<Full<Bytes>> {
    let contributions = match state.engine.list_by_user(user_id).await {
        Ok(list) => list,
        Err(e) => return arbor_error_response(&e),
    };

    let total_rewards = contributions.iter().filter_map(|c| c.reward).sum();
    let verified = contributions
        .iter()
        .filter(|c| c.quality_score.is_some())
        .count();
    let rejected = contributions
        .iter()
        .filter(|c| c.state == LifecycleState::Rejected)
        .count();

    json_response(
        StatusCode::OK,
        &DashboardResponse {
            user_id: user_id.to_string(),
            contributions,
            total_rewards,
            verified,
            rejected,
        },
    )
}
