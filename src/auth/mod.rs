//! User identity and request authentication.
//!
//! [`service::AuthService`] owns registration, login, and token
//! issuance. [`middleware::jwt_auth_middleware`] guards the protected
//! routes and injects [`middleware::AuthUser`] for handlers to read.

pub mod middleware;
pub mod service;

pub use middleware::{AuthUser, jwt_auth_middleware, require_system};
pub use service::{AuthResponse, AuthService, Claims, LoginRequest, RegisterRequest};
