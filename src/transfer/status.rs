//! Transaction status and kind definitions
//!
//! Status IDs are designed for PostgreSQL storage as SMALLINT.
//! Terminal statuses: COMPLETED (10), FAILED (-10), REVERSED (-20).

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

/// Transaction lifecycle status
///
/// Legal transitions: PENDING -> COMPLETED, PENDING -> FAILED, and
/// COMPLETED -> REVERSED through a compensating flow. Nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransferStatus {
    /// Created inside the atomic unit, not yet committed as completed
    Pending = 0,

    /// Terminal: both ledger entries posted and committed
    Completed = 10,

    /// Terminal: the attempt failed; the idempotency key stays consumed
    Failed = -10,

    /// Terminal: compensated after completion
    Reversed = -20,
}

impl TransferStatus {
    /// Check if this is a terminal status (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Reversed
        )
    }

    /// Check whether `self -> to` is a legal transition
    pub fn can_transition_to(&self, to: TransferStatus) -> bool {
        matches!(
            (self, to),
            (TransferStatus::Pending, TransferStatus::Completed)
                | (TransferStatus::Pending, TransferStatus::Failed)
                | (TransferStatus::Completed, TransferStatus::Reversed)
        )
    }

    /// Get the numeric status ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferStatus::Pending),
            10 => Some(TransferStatus::Completed),
            -10 => Some(TransferStatus::Failed),
            -20 => Some(TransferStatus::Reversed),
            _ => None,
        }
    }

    /// Get human-readable status name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
            TransferStatus::Reversed => "REVERSED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferStatus::from_id(value).ok_or(())
    }
}

/// Transfer kind
///
/// The kind gates authorization only; both kinds share one posting path
/// so the ledger-write sequence can never diverge between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransferKind {
    /// User-to-user transfer; the actor must own the source account
    Peer = 1,
    /// Initial funding from the system account; requires the system credential
    SystemFunding = 2,
}

impl TransferKind {
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransferKind::Peer),
            2 => Some(TransferKind::SystemFunding),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Peer => "PEER",
            TransferKind::SystemFunding => "SYSTEM_FUNDING",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferKind {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferKind::from_id(value).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Reversed.is_terminal());

        assert!(!TransferStatus::Pending.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Completed));
        assert!(TransferStatus::Pending.can_transition_to(TransferStatus::Failed));
        assert!(TransferStatus::Completed.can_transition_to(TransferStatus::Reversed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!TransferStatus::Completed.can_transition_to(TransferStatus::Pending));
        assert!(!TransferStatus::Completed.can_transition_to(TransferStatus::Failed));
        assert!(!TransferStatus::Failed.can_transition_to(TransferStatus::Completed));
        assert!(!TransferStatus::Failed.can_transition_to(TransferStatus::Reversed));
        assert!(!TransferStatus::Reversed.can_transition_to(TransferStatus::Completed));
        assert!(!TransferStatus::Pending.can_transition_to(TransferStatus::Pending));
        assert!(!TransferStatus::Pending.can_transition_to(TransferStatus::Reversed));
    }

    #[test]
    fn test_status_id_roundtrip() {
        let statuses = [
            TransferStatus::Pending,
            TransferStatus::Completed,
            TransferStatus::Failed,
            TransferStatus::Reversed,
        ];

        for status in statuses {
            let id = status.id();
            let recovered = TransferStatus::from_id(id).unwrap();
            assert_eq!(status, recovered);
        }
    }

    #[test]
    fn test_invalid_status_id() {
        assert!(TransferStatus::from_id(999).is_none());
        assert!(TransferStatus::from_id(-999).is_none());
        assert!(TransferStatus::from_id(1).is_none());
    }

    #[test]
    fn test_kind_id_roundtrip() {
        for kind in [TransferKind::Peer, TransferKind::SystemFunding] {
            assert_eq!(TransferKind::from_id(kind.id()), Some(kind));
        }
        assert!(TransferKind::from_id(0).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferStatus::Pending.to_string(), "PENDING");
        assert_eq!(TransferStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(TransferStatus::Reversed.to_string(), "REVERSED");
        assert_eq!(TransferKind::SystemFunding.to_string(), "SYSTEM_FUNDING");
    }
}
