//! Ledger - append-only double-entry audit log
//!
//! Records every movement of funds as an immutable entry. Each completed
//! transaction contributes exactly one DEBIT/CREDIT pair with equal
//! amounts, so the signed sum over any set of complete transactions is
//! zero and an account balance is the fold of its entries.
//!
//! Entries are never updated or deleted. The store traits expose no
//! mutators and the SQL schema enforces the same rule with a trigger.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::{AccountId, EntryId, TransferId};

/// Entry direction
///
/// IDs are designed for PostgreSQL storage as SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum EntryType {
    Debit = 1,
    Credit = 2,
}

impl EntryType {
    /// Get the numeric ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EntryType::Debit),
            2 => Some(EntryType::Credit),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }

    /// Sign applied when folding entries into a balance
    #[inline]
    pub fn sign(&self) -> Decimal {
        match self {
            EntryType::Debit => Decimal::NEGATIVE_ONE,
            EntryType::Credit => Decimal::ONE,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for EntryType {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        EntryType::from_id(value).ok_or(())
    }
}

/// One immutable movement of funds against one account
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Unique entry ID (ULID, also the DB primary key)
    #[schema(value_type = String)]
    pub id: EntryId,
    /// Account the movement applies to
    #[schema(value_type = String)]
    pub account_id: AccountId,
    /// Positive magnitude; direction comes from `entry_type`
    #[serde(serialize_with = "crate::money::serialize_amount")]
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// DEBIT or CREDIT
    pub entry_type: EntryType,
    /// Transaction this entry belongs to
    #[schema(value_type = String)]
    pub transfer_id: TransferId,
}

impl LedgerEntry {
    /// Signed amount: CREDIT adds, DEBIT subtracts
    #[inline]
    pub fn signed_amount(&self) -> Decimal {
        self.amount * self.entry_type.sign()
    }
}

/// A balanced DEBIT/CREDIT pair for one transaction
///
/// Constructing the pair up front guarantees both legs carry the same
/// amount and transaction id; the store appends both or neither.
#[derive(Debug, Clone)]
pub struct EntryPair {
    pub debit: LedgerEntry,
    pub credit: LedgerEntry,
}

impl EntryPair {
    /// Build the pair for a transfer: DEBIT `from`, CREDIT `to`
    pub fn post(
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        transfer_id: TransferId,
    ) -> Self {
        Self {
            debit: LedgerEntry {
                id: EntryId::new(),
                account_id: from,
                amount,
                entry_type: EntryType::Debit,
                transfer_id,
            },
            credit: LedgerEntry {
                id: EntryId::new(),
                account_id: to,
                amount,
                entry_type: EntryType::Credit,
                transfer_id,
            },
        }
    }

    /// Net signed sum of the pair; zero for every well-formed pair
    pub fn net(&self) -> Decimal {
        self.debit.signed_amount() + self.credit.signed_amount()
    }
}

/// Fold entries into a balance: CREDIT adds, DEBIT subtracts.
/// An account with no entries has balance zero.
pub fn fold_balance<'a, I>(entries: I) -> Decimal
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries
        .into_iter()
        .map(LedgerEntry::signed_amount)
        .sum()
}
