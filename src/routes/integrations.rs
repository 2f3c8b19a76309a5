//! Integration endpoints
//!
//! - `POST /api/v1/integrations/{system}/sync` - sync one external system
//!
//! Unlike the lifecycle's fan-out — where failures become sync-result data —
//! the standalone endpoint surfaces the failure to the caller, since they
//! asked for exactly this system.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::{arbor_error_response, json_response, read_json_body};
use crate::server::AppState;

/// Request body for a single-system sync
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub target: String,
}

/// Handle POST /api/v1/integrations/{system}/sync
pub async fn handle_integration_sync(
    state: Arc<AppState>,
    system: &str,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let body: SyncRequest = match read_json_body(req).await {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match state.pool.sync_one(system, &body.target).await {
        Ok(ack) => json_response(StatusCode::OK, &ack),
        Err(e) => arbor_error_response(&e),
    }
}
