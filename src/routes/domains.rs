//! Domain dispatch endpoints
//!
//! - `POST /api/v1/domain-requests` - route a payload through a domain strategy
//! - `GET  /api/v1/domains`         - list registered domains

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{arbor_error_response, json_response, read_json_body};
use crate::server::AppState;

/// Request body for standalone domain dispatch
#[derive(Debug, Deserialize)]
pub struct DomainRequest {
    pub domain: String,
    pub payload: Value,
}

/// Handle POST /api/v1/domain-requests
pub async fn handle_domain_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let body: DomainRequest = match read_json_body(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match state.dispatcher.dispatch(&body.domain, body.payload).await {
        Ok(result) => json_response(
            StatusCode::OK,
            &json!({
                "domain": body.domain,
                "result": result,
            }),
        ),
        Err(e) => arbor_error_response(&e),
    }
}

/// Handle GET /api/v1/domains
pub fn handle_list_domains(state: Arc<AppState>) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &json!({ "domains": state.dispatcher.domains() }),
    )
}
