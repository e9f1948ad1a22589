//! Storage seam for the ledger
//!
//! Two traits split the persistence surface:
//!
//! - [`LedgerStore`]: pool-level reads and single-row writes that need no
//!   coordination, plus [`LedgerStore::begin`] to open a unit of work.
//! - [`LedgerUnit`]: a scoped unit of work. Every operation inside the
//!   balance-check-then-post window goes through one unit; the unit
//!   commits exactly once and rolls back when dropped uncommitted.
//!
//! Neither trait exposes any way to update or delete a ledger entry.
//! That omission is the immutability contract; the PostgreSQL backend
//! additionally installs a trigger so raw-SQL mutation attempts surface
//! as [`StoreError::Immutable`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{Account, AccountStatus};
use crate::core_types::{AccountId, TransferId, UserId};
use crate::ledger::{EntryPair, LedgerEntry};
use crate::transfer::{Transfer, TransferStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique idempotency-key constraint hit; the caller lost the race
    #[error("Idempotency key already exists")]
    DuplicateKey,

    /// A ledger-entry mutation was attempted and refused
    #[error("Ledger entries cannot be modified after creation")]
    Immutable,

    /// Compare-and-set status update found an unexpected current status
    #[error("Illegal status transition: {0}")]
    IllegalTransition(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// User row as stored (identity collaborator data)
///
/// `password_hash` never leaves this layer except into the auth service.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_system: bool,
}

/// Pool-level storage operations
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open a unit of work for an atomic check-then-post window
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError>;

    // === Accounts ===
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;
    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;
    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError>;

    /// Derived balance: fold of all committed entries, zero when none
    async fn balance(&self, id: AccountId) -> Result<Decimal, StoreError>;

    // === Transactions & entries ===
    async fn transfer_by_key(&self, key: &str) -> Result<Option<Transfer>, StoreError>;
    async fn entries_for_transfer(&self, id: TransferId)
        -> Result<Vec<LedgerEntry>, StoreError>;
    async fn entries_for_account(&self, id: AccountId)
        -> Result<Vec<LedgerEntry>, StoreError>;

    /// Signed sum over the whole ledger; always zero when every
    /// transaction posted a balanced pair
    async fn trial_balance(&self) -> Result<Decimal, StoreError>;

    // === Users (identity collaborator) ===
    /// Fails with `DuplicateKey` when the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    // === Revoked tokens (logout denylist) ===
    /// Put a token on the denylist until `expires_at`. Revoking a token
    /// that is already listed is a no-op, so logout can be retried.
    async fn revoke_token(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// True while the token is on the denylist and not yet expired
    async fn is_token_revoked(&self, token: &str) -> Result<bool, StoreError>;

    /// Storage liveness check
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// A unit of work over the ledger
///
/// Dropping an uncommitted unit rolls back everything it staged. Locks
/// acquired by [`LedgerUnit::lock_account`] are held until commit or drop.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Fetch an account and lock it against concurrent units.
    ///
    /// Callers locking two accounts must lock in ascending id order so
    /// concurrent transfers cannot deadlock.
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Derived balance as seen by this unit (locked rows included)
    async fn balance_of(&mut self, id: AccountId) -> Result<Decimal, StoreError>;

    /// Insert a transaction under the idempotency unique constraint;
    /// fails with `DuplicateKey` when the key exists
    async fn insert_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError>;

    /// Append the DEBIT/CREDIT pair; both rows or neither
    async fn append_pair(&mut self, pair: &EntryPair) -> Result<(), StoreError>;

    /// Compare-and-set status transition; fails with `IllegalTransition`
    /// when the current status is not `expected`
    async fn set_transfer_status(
        &mut self,
        id: TransferId,
        expected: TransferStatus,
        to: TransferStatus,
    ) -> Result<(), StoreError>;

    /// Flip account lifecycle status (close flow)
    async fn set_account_status(
        &mut self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<(), StoreError>;

    /// Commit everything staged in this unit
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
