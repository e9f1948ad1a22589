//! Account model
//!
//! An account carries identity, ownership, and lifecycle status only.
//! There is deliberately no balance field anywhere on this struct: the
//! balance is always derived by folding the account's ledger entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::{AccountId, UserId};

/// Account lifecycle status
///
/// Status IDs are designed for PostgreSQL storage as SMALLINT.
/// CLOSED is terminal; accounts are never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum AccountStatus {
    Active = 1,
    Closed = 2,
}

impl AccountStatus {
    /// Get the numeric status ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(AccountStatus::Active),
            2 => Some(AccountStatus::Closed),
            _ => None,
        }
    }

    /// Get human-readable status name
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Closed => "CLOSED",
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for AccountStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        AccountStatus::from_id(value).ok_or(())
    }
}

/// A user-owned account
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique account ID (ULID, also the DB primary key)
    #[schema(value_type = String)]
    pub id: AccountId,
    /// Owning user
    pub owner_id: UserId,
    /// Lifecycle status
    pub status: AccountStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new ACTIVE account for an owner
    pub fn open(owner_id: UserId) -> Self {
        Self {
            id: AccountId::new(),
            owner_id,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account[{}] owner={} status={}",
            self.id, self.owner_id, self.status
        )
    }
}
