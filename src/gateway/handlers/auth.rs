//! Registration, login, and logout handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};

use super::super::state::AppState;
use super::super::types::{ApiResponse, ApiResult, created, ok, ok_message};
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};

/// Register a new user
///
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input or email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let session = state.auth.register(req).await?;
    created("User registered successfully", session)
}

/// Login user
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let session = state.auth.login(req).await?;
    ok("Login successful", session)
}

/// Logout: revoke the presented bearer token
///
/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "User logged out successfully"),
        (status = 503, description = "Denylist write failed")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult<()> {
    // A request without a token still succeeds: there is nothing to revoke
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    if let Some(token) = token {
        state.auth.logout(token).await?;
    }
    ok_message("User logged out successfully")
}
