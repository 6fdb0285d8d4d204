pub mod rate_limit;
pub mod request_id;
pub mod timeout;

pub use rate_limit::RateLimitLayer;
pub use request_id::RequestIdLayer;
pub use timeout::TimeoutLayer;

mod trace {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use tracing::Span;
    use tower_http::classify::ServerErrorsFailureClass;

    use super::request_id::RequestId;

    pub fn make_span_with(request: &Request<Body>) -> Span {
        let id = RequestId::try_get(request).expect("missing request id");

        tracing::info_span!(
            "http",
            id = id.id(),
            version = ?request.version(),
            method = %request.method(),
            uri = %request.uri(),
            status = tracing::field::Empty
        )
    }

    pub fn on_request(_request: &Request<Body>, _span: &Span) {}

    pub fn on_response(response: &Response<Body>, latency: Duration, span: &Span) {
        span.record("status", tracing::field::display(response.status()));

        tracing::info!("{latency:#?}")
    }

    pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
        tracing::error!("{error} {latency:#?}")
    }
}

pub use trace::{make_span_with, on_request, on_response, on_failure};
