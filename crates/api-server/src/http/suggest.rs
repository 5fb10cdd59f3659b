use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use shared::models::GiftRequest;
use tracing::{info, warn};

use super::AppState;
use super::errors::{agent_error_response, bad_request_response};

pub(super) async fn suggest_gift(
    State(state): State<AppState>,
    payload: Result<Json<GiftRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let detail = rejection.body_text();
            warn!(detail = %detail, "rejected malformed gift request");
            return bad_request_response(&detail);
        }
    };

    if let Err(err) = request.validate() {
        warn!(error = %err, "rejected invalid gift request");
        return bad_request_response(&err.to_string());
    }

    info!(
        message_chars = request.user_message.chars().count(),
        context_keys = request.context.as_ref().map_or(0, |context| context.len()),
        "received gift request"
    );

    match state.agent.generate(&request.user_message).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => agent_error_response(&err),
    }
}
