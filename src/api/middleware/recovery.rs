use axum::{http::StatusCode, response::Response, Router};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::api::error::{error_response, INTERNAL_ERROR_MESSAGE};

/// Turn a caught panic into the generic 500 body. The panic message is only
/// logged.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };

    error!(panic = %detail, "panic while handling request");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}

pub fn wrap(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(panic_response))
}
