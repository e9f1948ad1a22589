//! Transfer handlers: peer transfers and system funding

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use super::super::state::AppState;
use super::super::types::{
    ApiResponse, ApiResult, SystemFundingRequest, TransactionRequest, created, ok,
};
use crate::account::Account;
use crate::auth::AuthUser;
use crate::error::LedgerError;
use crate::transfer::{Transfer, TransferOutcome, TransferRequest};

/// Map an engine outcome to the wire response.
///
/// Fresh transfers answer 201; idempotent replays answer 200 with the
/// original record.
fn respond(outcome: TransferOutcome) -> ApiResult<Transfer> {
    match outcome {
        TransferOutcome::Completed(t) => created("Transaction completed successfully", t),
        TransferOutcome::Replayed(t) => ok(
            "Transaction already completed for the provided idempotency key",
            t,
        ),
        TransferOutcome::InProgress(t) => ok(
            "Transaction is still pending for the provided idempotency key",
            t,
        ),
    }
}

/// Transfer funds between two of the caller's accounts
///
/// POST /api/transactions
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = TransactionRequest,
    responses(
        (status = 201, description = "Transaction completed", body = ApiResponse<Transfer>),
        (status = 200, description = "Idempotent replay of an earlier call", body = ApiResponse<Transfer>),
        (status = 400, description = "Invalid amount, key, or self transfer"),
        (status = 404, description = "Account not found or not owned by caller"),
        (status = 409, description = "Idempotency key consumed by a failed transaction"),
        (status = 422, description = "Insufficient funds or inactive account")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<TransactionRequest>,
) -> ApiResult<Transfer> {
    let request = TransferRequest::peer(
        req.from_account,
        req.to_account,
        req.amount.inner(),
        req.idempotency_key,
    );
    let outcome = state.engine.transfer(request, user.actor()).await?;
    respond(outcome)
}

/// Fund an account from the system account
///
/// POST /api/transactions/system/initial-funds
///
/// Requires the system credential. The source is resolved from the
/// system user's own ACTIVE accounts; the posting path is the same as a
/// peer transfer except the source balance check is skipped (the system
/// account is the one account allowed to go negative).
#[utoipa::path(
    post,
    path = "/api/transactions/system/initial-funds",
    request_body = SystemFundingRequest,
    responses(
        (status = 201, description = "Funding completed", body = ApiResponse<Transfer>),
        (status = 200, description = "Idempotent replay of an earlier call", body = ApiResponse<Transfer>),
        (status = 403, description = "Caller is not the system user"),
        (status = 404, description = "Destination account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn create_initial_funds(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SystemFundingRequest>,
) -> ApiResult<Transfer> {
    let accounts = state.registry.accounts_for(user.user_id).await?;
    let source = accounts
        .into_iter()
        .find(Account::is_active)
        .ok_or_else(|| {
            LedgerError::InvalidRequest("system user has no active account".to_string())
        })?;

    let request = TransferRequest::system_funding(
        source.id,
        req.to_account,
        req.amount.inner(),
        req.idempotency_key,
    );
    let outcome = state.engine.transfer(request, user.actor()).await?;
    respond(outcome)
}
