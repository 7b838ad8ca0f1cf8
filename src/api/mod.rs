pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;


pub use error::{ApiError, ApiResult};
pub use server::{build_from_config, create_app, init_tracing, run_server};
