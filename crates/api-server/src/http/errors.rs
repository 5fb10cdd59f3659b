use std::any::Any;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::agent::AgentError;
use shared::models::ErrorResponse;
use tracing::{error, warn};

pub(super) const CONFIGURATION_ERROR_DETAIL: &str =
    "Configuration error: unable to load settings. Check the service environment variables.";
pub(super) const GENERATION_FAILED_DETAIL: &str =
    "Failed to generate gift suggestions. Please try again.";
pub(super) const UNEXPECTED_ERROR_DETAIL: &str = "An unexpected error occurred.";

pub(super) fn bad_request_response(detail: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, detail)
}

pub(super) fn internal_error_response(detail: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, detail)
}

fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(ErrorResponse::new(detail))).into_response()
}

pub(super) fn agent_error_response(err: &AgentError) -> Response {
    if err.is_configuration() {
        warn!(
            error_kind = err.kind(),
            error = %err,
            "gift request rejected: service configuration is incomplete"
        );
        return bad_request_response(CONFIGURATION_ERROR_DETAIL);
    }

    error!(
        error_kind = err.kind(),
        error = %err,
        "gift suggestion generation failed"
    );
    internal_error_response(GENERATION_FAILED_DETAIL)
}

pub(super) async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

pub(super) fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = message, "unhandled error while serving request");

    internal_error_response(UNEXPECTED_ERROR_DETAIL)
}
