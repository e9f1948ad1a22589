//! ledgerd - Personal Ledger Service
//!
//! A double-entry ledger backend: users register, open accounts, and
//! move funds atomically with idempotent retries. Balances are never
//! stored; every read folds the account's immutable entry history.
//!
//! # Modules
//!
//! - [`core_types`] - ULID-backed id newtypes (AccountId, TransferId, ...)
//! - [`money`] - Amount parsing, validation, and formatting
//! - [`account`] - Account record and lifecycle status
//! - [`ledger`] - Double-entry types and balance folding
//! - [`transfer`] - Transaction record and the posting engine
//! - [`registry`] - Account lifecycle operations and balance queries
//! - [`store`] - Storage seam: in-memory and PostgreSQL backends
//! - [`auth`] - Registration, login, JWT middleware
//! - [`notify`] - Post-commit notification sink
//! - [`gateway`] - HTTP API (axum) and OpenAPI docs

// Core types - must be first!
pub mod core_types;

// Domain
pub mod account;
pub mod error;
pub mod ledger;
pub mod money;
pub mod registry;
pub mod transfer;

// Collaborators
pub mod auth;
pub mod notify;

// Infrastructure
pub mod config;
pub mod gateway;
pub mod logging;
pub mod store;

// Convenient re-exports at crate root
pub use account::{Account, AccountStatus};
pub use core_types::{AccountId, EntryId, TransferId, UserId};
pub use error::LedgerError;
pub use ledger::{EntryPair, EntryType, LedgerEntry};
pub use registry::AccountRegistry;
pub use store::{LedgerStore, LedgerUnit, MemoryStore, PgStore, StoreError};
pub use transfer::{
    Actor, Transfer, TransferEngine, TransferKind, TransferOutcome, TransferRequest,
    TransferStatus,
};
