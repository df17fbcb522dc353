pub mod auth;
pub mod roles;

pub use auth::{auth_middleware, AuthUser};
pub use roles::admin_only;
