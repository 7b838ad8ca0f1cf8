use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

use crate::api::error::ApiError;
use crate::auth::jwt::{extract_bearer, TokenCodec};

/// Identity attached to a request by [`require_bearer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i64);

/// User id of the current request, `0` when no identity was attached
/// (gate disabled, or route not behind it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl CurrentUser {
    pub const ANONYMOUS: i64 = 0;

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.0)
                .unwrap_or(Self::ANONYMOUS),
        ))
    }
}

/// Bearer-token gate. Rejects with 401 before anything downstream runs.
///
/// Install with `axum::middleware::from_fn_with_state(codec, require_bearer)`.
pub async fn require_bearer(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = {
        let auth_header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        extract_bearer(auth_header).and_then(|token| codec.verify(token))
    };

    let user_id = match verified {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "Rejected unauthenticated request");
            return ApiError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(AuthenticatedUser(user_id));
    next.run(request).await
}
