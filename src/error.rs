//! Domain Error Types
//!
//! One error taxonomy for the account registry and the transfer engine,
//! with stable machine-readable codes for API responses.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::MoneyError;
use crate::store::StoreError;
use crate::transfer::TransferStatus;

/// Ledger domain errors
///
/// Error codes are stable identifiers carried in API responses.
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Not allowed for this user")]
    Forbidden,

    // === Account Errors ===
    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is not active")]
    AccountInactive,

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    // === Close Errors ===
    #[error("Account is already closed")]
    AlreadyClosed,

    #[error("Account balance must be zero to close, found {0}")]
    NonZeroBalance(Decimal),

    // === Idempotency Errors ===
    #[error("Idempotency key already used by a {0} transaction")]
    KeyConsumed(TransferStatus),

    // === Contract Violations ===
    #[error("Ledger entries cannot be modified after creation")]
    Immutable,

    #[error("Illegal status transition: {0}")]
    IllegalTransition(String),

    // === Infrastructure ===
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidRequest(_) => "INVALID_REQUEST",
            LedgerError::Unauthorized => "UNAUTHORIZED",
            LedgerError::Forbidden => "FORBIDDEN",
            LedgerError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            LedgerError::AccountInactive => "ACCOUNT_INACTIVE",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::AlreadyClosed => "ALREADY_CLOSED",
            LedgerError::NonZeroBalance(_) => "NON_ZERO_BALANCE",
            LedgerError::KeyConsumed(_) => "IDEMPOTENCY_KEY_CONSUMED",
            LedgerError::Immutable => "LEDGER_IMMUTABLE",
            LedgerError::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            LedgerError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidRequest(_) => 400,
            LedgerError::Unauthorized => 401,
            LedgerError::Forbidden => 403,
            LedgerError::AccountNotFound => 404,
            LedgerError::AccountInactive
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::NonZeroBalance(_) => 422,
            LedgerError::AlreadyClosed | LedgerError::KeyConsumed(_) => 409,
            LedgerError::Immutable | LedgerError::IllegalTransition(_) => 500,
            LedgerError::Persistence(_) => 503,
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(e: MoneyError) -> Self {
        LedgerError::InvalidRequest(e.to_string())
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            // DuplicateKey is resolved by the engine via replay; reaching
            // here means a raced insert we could not re-read.
            StoreError::DuplicateKey => {
                LedgerError::Persistence("idempotency key raced".to_string())
            }
            StoreError::Immutable => LedgerError::Immutable,
            StoreError::IllegalTransition(msg) => LedgerError::IllegalTransition(msg),
            StoreError::Backend(msg) => LedgerError::Persistence(msg),
        }
    }
}

impl From<anyhow::Error> for LedgerError {
    fn from(e: anyhow::Error) -> Self {
        LedgerError::Persistence(e.to_string())
    }
}
