//! JWT authentication middleware for protected routes

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::core_types::UserId;
use crate::error::LedgerError;
use crate::gateway::state::AppState;
use crate::gateway::types::ApiError;
use crate::transfer::Actor;

/// Authenticated caller, injected as a request extension by
/// [`jwt_auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: UserId,
    pub is_system: bool,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_system: self.is_system,
        }
    }
}

/// Verify the bearer token and attach [`AuthUser`] to the request.
///
/// Tokens on the logout denylist are refused before signature
/// verification. `is_system` comes from the user row, not from the
/// token, so revoking the flag takes effect on the next request.
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(LedgerError::Unauthorized)?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(LedgerError::Unauthorized)?;

    if state
        .store
        .is_token_revoked(token)
        .await
        .map_err(LedgerError::from)?
    {
        return Err(LedgerError::Unauthorized.into());
    }

    let claims = state.auth.verify_token(token)?;
    let user_id: UserId = claims.sub.parse().map_err(|_| LedgerError::Unauthorized)?;

    let user = state
        .store
        .user_by_id(user_id)
        .await
        .map_err(LedgerError::from)?
        .ok_or(LedgerError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser {
        user_id: user.user_id,
        is_system: user.is_system,
    });

    Ok(next.run(request).await)
}

/// Reject callers whose user row is not flagged as the system identity.
///
/// Must be layered inside [`jwt_auth_middleware`] so the extension is
/// already present.
pub async fn require_system(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or(LedgerError::Unauthorized)?;

    if !user.is_system {
        return Err(LedgerError::Forbidden.into());
    }

    Ok(next.run(request).await)
}
