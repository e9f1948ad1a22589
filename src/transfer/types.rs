//! Transfer Core Types
//!
//! The persisted transaction record and the engine's request/outcome types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::{AccountId, TransferId, UserId};

use super::status::{TransferKind, TransferStatus};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 64;

/// Transaction record stored in the transaction record store
///
/// Exactly one record ever exists per idempotency key; the key column
/// carries a unique constraint and retries observe the original record.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Unique transaction ID (ULID, also the DB primary key)
    #[schema(value_type = String)]
    pub id: TransferId,
    /// Debited account
    #[schema(value_type = String)]
    pub from_account: AccountId,
    /// Credited account
    #[schema(value_type = String)]
    pub to_account: AccountId,
    /// Positive amount moved, fixed two-decimal string on the wire
    #[serde(serialize_with = "crate::money::serialize_amount")]
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Caller-supplied idempotency key (globally unique)
    pub idempotency_key: String,
    /// Lifecycle status
    pub status: TransferStatus,
    /// Peer transfer or system funding
    pub kind: TransferKind,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction[{}] {} -> {} amount={} key={} status={}",
            self.id, self.from_account, self.to_account, self.amount, self.idempotency_key, self.status
        )
    }
}

/// Authenticated caller identity, resolved by the identity provider
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: UserId,
    pub is_system: bool,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_system: false,
        }
    }

    pub fn system(user_id: UserId) -> Self {
        Self {
            user_id,
            is_system: true,
        }
    }
}

/// Transfer request entering the engine
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Source account (for system funding: resolved to the system account)
    pub from_account: AccountId,
    /// Target account
    pub to_account: AccountId,
    /// Positive amount
    pub amount: Decimal,
    /// Caller idempotency key
    pub idempotency_key: String,
    /// Peer or system funding; decides the authorization predicate
    pub kind: TransferKind,
}

impl TransferRequest {
    /// Build a peer-to-peer transfer request
    pub fn peer(
        from_account: AccountId,
        to_account: AccountId,
        amount: Decimal,
        idempotency_key: String,
    ) -> Self {
        Self {
            from_account,
            to_account,
            amount,
            idempotency_key,
            kind: TransferKind::Peer,
        }
    }

    /// Build a system-funding request; the source is the system account
    pub fn system_funding(
        system_account: AccountId,
        to_account: AccountId,
        amount: Decimal,
        idempotency_key: String,
    ) -> Self {
        Self {
            from_account: system_account,
            to_account,
            amount,
            idempotency_key,
            kind: TransferKind::SystemFunding,
        }
    }
}

/// Engine outcome for a successful call
///
/// Replays of a COMPLETED key succeed without doing new work; a replay
/// while the original is still PENDING reports in-progress so callers
/// poll instead of double-submitting.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// Fresh transfer, committed in this call
    Completed(Transfer),
    /// Idempotent replay of an already COMPLETED transaction
    Replayed(Transfer),
    /// Key seen, original attempt still PENDING
    InProgress(Transfer),
}

impl TransferOutcome {
    /// The transaction record behind this outcome
    pub fn record(&self) -> &Transfer {
        match self {
            TransferOutcome::Completed(t)
            | TransferOutcome::Replayed(t)
            | TransferOutcome::InProgress(t) => t,
        }
    }

    /// True when this call itself posted the ledger pair
    pub fn is_fresh(&self) -> bool {
        matches!(self, TransferOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kinds() {
        let from = AccountId::new();
        let to = AccountId::new();

        let peer = TransferRequest::peer(from, to, Decimal::from(10), "k1".into());
        assert_eq!(peer.kind, TransferKind::Peer);

        let funding = TransferRequest::system_funding(from, to, Decimal::from(10), "k2".into());
        assert_eq!(funding.kind, TransferKind::SystemFunding);
        assert_eq!(funding.from_account, from);
    }

    #[test]
    fn test_actor_constructors() {
        assert!(!Actor::user(7).is_system);
        assert!(Actor::system(1).is_system);
    }

    #[test]
    fn test_outcome_record() {
        let t = Transfer {
            id: TransferId::new(),
            from_account: AccountId::new(),
            to_account: AccountId::new(),
            amount: Decimal::from(5),
            idempotency_key: "k".into(),
            status: TransferStatus::Completed,
            kind: TransferKind::Peer,
            created_at: Utc::now(),
        };

        let fresh = TransferOutcome::Completed(t.clone());
        assert!(fresh.is_fresh());
        assert_eq!(fresh.record().id, t.id);

        let replay = TransferOutcome::Replayed(t);
        assert!(!replay.is_fresh());
    }
}
