//! Transfer Subsystem
//!
//! Moves funds between accounts through an append-only double-entry
//! ledger. The engine owns all writes to the transaction record store
//! and the ledger entry store; nothing else in the crate creates those
//! rows.
//!
//! # State Machine
//!
//! ```text
//! PENDING → COMPLETED → REVERSED (compensating flow only)
//!     ↓
//!  FAILED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **One record per key**: the idempotency key is unique in storage;
//!    replays answer with the original record, never new work
//! 2. **Balanced pairs**: every COMPLETED transaction carries exactly one
//!    DEBIT and one CREDIT of equal amount; the signed ledger sum is zero
//! 3. **Atomic window**: balance check, PENDING insert, ledger pair, and
//!    completion commit or roll back as one storage unit
//! 4. **No stored balances**: every balance is derived from the ledger at
//!    read time

pub mod engine;
pub mod status;
pub mod types;


// Re-exports for convenience
pub use engine::TransferEngine;
pub use status::{TransferKind, TransferStatus};
pub use types::{
    Actor, Transfer, TransferOutcome, TransferRequest, MAX_IDEMPOTENCY_KEY_LEN,
};
