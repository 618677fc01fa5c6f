//! Centralized error responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use warden_auth::GateError;

/// Map a gate failure to its response: 401 when the caller must
/// (re-)authenticate, 403 when the principal lacks the rights.
pub fn gate_error_to_response(err: &GateError) -> axum::response::Response {
    match err {
        GateError::Authentication(_) => {
            let mut response = json_error(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Please authenticate",
            );
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            response
        }
        GateError::Authorization(_) => json_error(StatusCode::FORBIDDEN, "forbidden", "Forbidden"),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
