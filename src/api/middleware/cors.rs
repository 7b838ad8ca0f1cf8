use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_EXPOSE_HEADERS, ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Method, Request, Response, StatusCode,
    },
    response::IntoResponse,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type,Authorization";
const EXPOSED_HEADERS: &str = "Content-Type";

/// Origin allow-list.
///
/// Parsed from a comma-separated list; an empty list or a `*` entry allows
/// any origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    origins: Vec<String>,
    allow_any: bool,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::allow_any()
    }
}

impl CorsPolicy {
    pub fn allow_any() -> Self {
        Self {
            origins: Vec::new(),
            allow_any: true,
        }
    }

    pub fn parse(csv: &str) -> Self {
        let origins: Vec<String> = csv
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            return Self::allow_any();
        }

        Self {
            origins,
            allow_any: false,
        }
    }

    pub fn allows_any(&self) -> bool {
        self.allow_any
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allow_any || self.origins.iter().any(|allowed| allowed == origin)
    }

    /// Headers to attach for a request carrying `origin`, or `None` when the
    /// origin is absent or not allowed.
    pub fn headers_for(&self, origin: Option<&HeaderValue>) -> Option<HeaderMap> {
        let origin = origin?;
        if !self.allows(origin.to_str().ok()?) {
            return None;
        }

        let allow_origin = if self.allow_any {
            HeaderValue::from_static("*")
        } else {
            origin.clone()
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSED_HEADERS),
        );
        Some(headers)
    }
}

/// Tower layer applying a [`CorsPolicy`].
///
/// Every `OPTIONS` request is answered here with 204 and never reaches the
/// inner service. Other requests pass through; matching origins get the
/// CORS headers on the way out, non-matching ones are not blocked.
///
/// `tower_http::cors::CorsLayer` can't stand in here: it rejects a wildcard
/// origin combined with credentials, and only answers `OPTIONS` requests
/// that carry preflight headers.
#[derive(Debug, Clone)]
pub struct CorsLayer {
    policy: Arc<CorsPolicy>,
}

impl CorsLayer {
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = CorsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsService<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Service<Request<Body>> for CorsService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, context: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(context)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let cors_headers = self.policy.headers_for(request.headers().get(ORIGIN));

        if request.method() == Method::OPTIONS {
            let mut response = StatusCode::NO_CONTENT.into_response();
            if let Some(headers) = cors_headers {
                response.headers_mut().extend(headers);
            }
            return Box::pin(async move { Ok(response) });
        }

        // Call the instance that was polled ready, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            if let Some(headers) = cors_headers {
                response.headers_mut().extend(headers);
            }
            Ok(response)
        })
    }
}
