//! Endpoints built from the grant and response types.
mod authenticate;
mod authorize;

pub use self::authenticate::{Authenticate, BearerAuthenticator};
pub use self::authorize::AuthorizeHandler;
pub use crate::response_types::AuthorizeOptions;
