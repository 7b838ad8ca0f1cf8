pub mod gate;
pub mod jwt;

pub use gate::{require_bearer, AuthenticatedUser, CurrentUser};
pub use jwt::{extract_bearer, AuthError, TokenCodec};
