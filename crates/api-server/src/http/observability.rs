use axum::extract::{MatchedPath, Request};
use axum::http::HeaderValue;
use axum::{Router, middleware};
use tower_http::LatencyUnit;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Wraps every route in a request-id scoped span.
///
/// Client ids are kept when they look sane and replaced with a UUID v4 otherwise; the
/// final id is echoed back in `x-request-id`. Logs emitted while handling the request carry
/// `request_id`, `method` and `route` from the span.
pub(super) fn with_request_tracing(router: Router) -> Router {
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(GiftRequestSpan)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::map_request(discard_invalid_request_id))
}

#[derive(Debug, Clone, Copy, Default)]
struct GiftRequestSpan;

impl<B> MakeSpan<B> for GiftRequestSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .unwrap_or("-");
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map_or_else(|| request.uri().path(), MatchedPath::as_str);

        tracing::info_span!(
            "gift_api_request",
            request_id = %request_id,
            method = %request.method(),
            route = %route,
        )
    }
}

async fn discard_invalid_request_id(mut request: Request) -> Request {
    let invalid = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .is_some_and(|value| !is_valid_request_id(value));
    if invalid {
        request.headers_mut().remove(REQUEST_ID_HEADER);
    }
    request
}

fn is_valid_request_id(value: &HeaderValue) -> bool {
    let Ok(raw) = value.to_str() else {
        return false;
    };
    !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'))
}
