//! Account lifecycle and query handlers

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{ApiResponse, ApiResult, BalanceData, created, ok};
use crate::account::Account;
use crate::auth::AuthUser;
use crate::core_types::AccountId;
use crate::error::LedgerError;
use crate::money;

fn parse_account_id(raw: &str) -> Result<AccountId, LedgerError> {
    raw.parse()
        .map_err(|_| LedgerError::InvalidRequest("invalid account id".to_string()))
}

/// Open a new account for the caller
///
/// POST /api/accounts
#[utoipa::path(
    post,
    path = "/api/accounts",
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<Account>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn open_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Account> {
    let account = state.registry.open_account(user.user_id).await?;
    created("Account created successfully", account)
}

/// List all accounts owned by the caller
///
/// GET /api/accounts
#[utoipa::path(
    get,
    path = "/api/accounts",
    responses(
        (status = 200, description = "Accounts retrieved", body = ApiResponse<Vec<Account>>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Account>> {
    let accounts = state.registry.accounts_for(user.user_id).await?;
    ok("Accounts retrieved successfully", accounts)
}

/// Derived balance for one of the caller's accounts
///
/// GET /api/accounts/{id}/balance
#[utoipa::path(
    get,
    path = "/api/accounts/{id}/balance",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Balance retrieved", body = ApiResponse<BalanceData>),
        (status = 404, description = "Account not found or not owned by caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn account_balance(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<BalanceData> {
    let account_id = parse_account_id(&id)?;
    let balance = state.registry.balance(account_id, user.user_id).await?;
    ok(
        "Balance retrieved successfully",
        BalanceData {
            account_id,
            balance: money::format_amount(balance),
        },
    )
}

/// Close one of the caller's accounts
///
/// DELETE /api/accounts/{id}
///
/// Only an ACTIVE account with a derived balance of exactly zero can be
/// closed. CLOSED is terminal.
#[utoipa::path(
    delete,
    path = "/api/accounts/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account closed", body = ApiResponse<Account>),
        (status = 404, description = "Account not found or not owned by caller"),
        (status = 409, description = "Account already closed"),
        (status = 422, description = "Balance is not zero")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn close_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Account> {
    let account_id = parse_account_id(&id)?;
    let account = state.registry.close_account(account_id, user.user_id).await?;
    ok("Account closed successfully", account)
}

/// Resolve a recipient's ACTIVE accounts by email
///
/// GET /api/accounts/resolve/{email}
///
/// Used by senders to pick a destination account. The caller's own
/// email is rejected.
#[utoipa::path(
    get,
    path = "/api/accounts/resolve/{email}",
    params(("email" = String, Path, description = "Recipient email")),
    responses(
        (status = 200, description = "Recipient accounts", body = ApiResponse<Vec<Account>>),
        (status = 400, description = "Email belongs to the caller"),
        (status = 404, description = "No user with that email")
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn resolve_recipient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(email): Path<String>,
) -> ApiResult<Vec<Account>> {
    let accounts = state
        .registry
        .resolve_recipient(&email, user.user_id)
        .await?;
    ok("Recipient accounts resolved successfully", accounts)
}
