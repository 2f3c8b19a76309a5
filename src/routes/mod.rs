//! HTTP routes for Arbor
//!
//! Thin JSON handlers over the injected components. Handlers translate
//! success and error into HTTP status codes and never leak internal errors
//! as anything but structured bodies.

pub mod ai;
pub mod contributions;
pub mod domains;
pub mod health;
pub mod integrations;
pub mod status;
pub mod workflows;

pub use ai::{handle_ai_query, handle_risk_assessment};
pub use contributions::{
    handle_advance, handle_dashboard, handle_get_contribution, handle_submit, handle_verify,
};
pub use domains::{handle_domain_request, handle_list_domains};
pub use health::{health_check, overview, readiness_check, version_info};
pub use integrations::handle_integration_sync;
pub use status::status_check;
pub use workflows::{handle_workflow_run, handle_workflow_status};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::ArborError;

/// API error body shape
#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
    code: &'static str,
}

/// Serialize a value as a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value)
        .unwrap_or_else(|_| br#"{"error":"serialization failed","code":"internal"}"#.to_vec());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Structured error response
pub fn error_response(
    status: StatusCode,
    message: &str,
    code: &'static str,
) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ApiError {
            error: message.to_string(),
            code,
        },
    )
}

/// Map an [`ArborError`] onto its HTTP representation
pub fn arbor_error_response(err: &ArborError) -> Response<Full<Bytes>> {
    let status = match err {
        ArborError::Validation(_) => StatusCode::BAD_REQUEST,
        ArborError::NotFound(_) => StatusCode::NOT_FOUND,
        ArborError::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ArborError::Integration(_) => StatusCode::BAD_GATEWAY,
        ArborError::Conflict(_) => StatusCode::CONFLICT,
        ArborError::Fatal(_) | ArborError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &err.to_string(), err.kind())
}

/// 404 for unmatched paths
pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("no route for {}", path),
        "not_found",
    )
}

/// CORS preflight response
pub fn preflight_response(allowed_origin: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", allowed_origin)
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Read and deserialize a JSON request body
pub async fn read_json_body<T: DeserializeOwned>(
    req: Request<Incoming>,
) -> Result<T, Response<Full<Bytes>>> {
    let bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                &format!("failed to read request body: {}", e),
                "validation",
            ))
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("invalid JSON body: {}", e),
            "validation",
        )
    })
}
