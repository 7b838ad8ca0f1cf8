use axum::{body::Body, http::Request, http::Response, Router};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Span};

/// Log method, path, status and latency once the response is produced.
pub fn wrap(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            })
            .on_request(())
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_secs_f64() * 1000.0,
                    "request completed"
                );
            }),
    )
}
