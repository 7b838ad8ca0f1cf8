// Cross-cutting wrappers around the routed handlers.
//
// The chain is plain data: a list of `Middleware` values, outermost first.
// `apply_chain` folds it right-to-left so the first entry ends up as the
// outermost layer and sees each request first.

pub mod cors;
pub mod logging;
pub mod recovery;

use axum::Router;

pub use cors::{CorsLayer, CorsPolicy};

#[derive(Debug, Clone)]
pub enum Middleware {
    /// Convert panics below this point into a 500 JSON response
    Recovery,
    /// Answer preflights and attach CORS headers for allowed origins
    Cors(CorsPolicy),
    /// Log method, path, status and latency per request
    Logging,
}

impl Middleware {
    fn wrap(self, router: Router) -> Router {
        match self {
            Middleware::Recovery => recovery::wrap(router),
            Middleware::Cors(policy) => router.layer(CorsLayer::new(policy)),
            Middleware::Logging => logging::wrap(router),
        }
    }
}

/// Recovery, then CORS, then Logging.
pub fn default_chain(cors: CorsPolicy) -> Vec<Middleware> {
    vec![Middleware::Recovery, Middleware::Cors(cors), Middleware::Logging]
}

pub fn apply_chain(router: Router, chain: Vec<Middleware>) -> Router {
    chain
        .into_iter()
        .rev()
        .fold(router, |router, middleware| middleware.wrap(router))
}
