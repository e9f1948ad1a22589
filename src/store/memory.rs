//! In-memory ledger store
//!
//! Backs tests and Postgres-less dev runs. One store-wide async mutex
//! stands in for row locks: [`MemoryStore::begin`] takes the lock and the
//! unit holds it until commit or drop, which serializes every
//! check-then-post window just as row locking would, only coarser.
//! Writes are staged in the unit and applied on commit, so a dropped
//! unit leaves no trace.
//!
//! Pool-level reads take the same lock briefly; do not call them while
//! holding an open unit on the same task.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::account::{Account, AccountStatus};
use crate::core_types::{AccountId, TransferId, UserId};
use crate::ledger::{EntryPair, LedgerEntry, fold_balance};
use crate::transfer::{Transfer, TransferStatus};

use super::{LedgerStore, LedgerUnit, NewUser, StoreError, UserRecord};

#[derive(Default)]
struct MemState {
    users: FxHashMap<UserId, UserRecord>,
    next_user_id: UserId,
    accounts: FxHashMap<AccountId, Account>,
    transfers: FxHashMap<TransferId, Transfer>,
    transfer_by_key: FxHashMap<String, TransferId>,
    entries: Vec<LedgerEntry>,
    revoked_tokens: FxHashMap<String, DateTime<Utc>>,
}

impl MemState {
    fn fold_account(&self, id: AccountId) -> Decimal {
        fold_balance(self.entries.iter().filter(|e| e.account_id == id))
    }
}

/// In-memory [`LedgerStore`] backend
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemUnit {
            guard,
            staged: Staged::default(),
        }))
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, StoreError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.owner_id == owner)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn balance(&self, id: AccountId) -> Result<Decimal, StoreError> {
        let state = self.state.lock().await;
        Ok(state.fold_account(id))
    }

    async fn transfer_by_key(&self, key: &str) -> Result<Option<Transfer>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .transfer_by_key
            .get(key)
            .and_then(|id| state.transfers.get(id))
            .cloned())
    }

    async fn entries_for_transfer(
        &self,
        id: TransferId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.transfer_id == id)
            .cloned()
            .collect())
    }

    async fn entries_for_account(
        &self,
        id: AccountId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| e.account_id == id)
            .cloned()
            .collect())
    }

    async fn trial_balance(&self) -> Result<Decimal, StoreError> {
        let state = self.state.lock().await;
        Ok(fold_balance(&state.entries))
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey);
        }

        state.next_user_id += 1;
        let record = UserRecord {
            user_id: state.next_user_id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            is_system: user.is_system,
            created_at: Utc::now(),
        };
        state.users.insert(record.user_id, record.clone());
        Ok(record)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn revoke_token(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        // Expired entries are swept on each revocation
        let now = Utc::now();
        state.revoked_tokens.retain(|_, exp| *exp > now);
        state.revoked_tokens.insert(token.to_string(), expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .revoked_tokens
            .get(token)
            .is_some_and(|exp| *exp > Utc::now()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Writes staged by a unit, applied on commit only
#[derive(Default)]
struct Staged {
    transfers: Vec<Transfer>,
    entries: Vec<LedgerEntry>,
    transfer_status: Vec<(TransferId, TransferStatus)>,
    account_status: Vec<(AccountId, AccountStatus)>,
}

/// Unit of work over [`MemoryStore`]; owns the store lock until done
struct MemUnit {
    guard: OwnedMutexGuard<MemState>,
    staged: Staged,
}

#[async_trait]
impl LedgerUnit for MemUnit {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        // The unit already owns the store lock; just read through staging
        let mut account = self.guard.accounts.get(&id).cloned();
        if let Some(ref mut a) = account {
            if let Some((_, status)) = self
                .staged
                .account_status
                .iter()
                .rev()
                .find(|(sid, _)| *sid == id)
            {
                a.status = *status;
            }
        }
        Ok(account)
    }

    async fn balance_of(&mut self, id: AccountId) -> Result<Decimal, StoreError> {
        let committed = self.guard.fold_account(id);
        let staged = fold_balance(self.staged.entries.iter().filter(|e| e.account_id == id));
        Ok(committed + staged)
    }

    async fn insert_transfer(&mut self, transfer: &Transfer) -> Result<(), StoreError> {
        if self.guard.transfer_by_key.contains_key(&transfer.idempotency_key)
            || self
                .staged
                .transfers
                .iter()
                .any(|t| t.idempotency_key == transfer.idempotency_key)
        {
            return Err(StoreError::DuplicateKey);
        }
        self.staged.transfers.push(transfer.clone());
        Ok(())
    }

    async fn append_pair(&mut self, pair: &EntryPair) -> Result<(), StoreError> {
        self.staged.entries.push(pair.debit.clone());
        self.staged.entries.push(pair.credit.clone());
        Ok(())
    }

    async fn set_transfer_status(
        &mut self,
        id: TransferId,
        expected: TransferStatus,
        to: TransferStatus,
    ) -> Result<(), StoreError> {
        // A transaction inserted by this same unit lives in staging
        if let Some(staged) = self.staged.transfers.iter_mut().find(|t| t.id == id) {
            if staged.status != expected {
                return Err(StoreError::IllegalTransition(format!(
                    "transaction {} is {}, expected {}",
                    id, staged.status, expected
                )));
            }
            staged.status = to;
            return Ok(());
        }

        match self.guard.transfers.get(&id) {
            Some(t) if t.status == expected => {
                self.staged.transfer_status.push((id, to));
                Ok(())
            }
            Some(t) => Err(StoreError::IllegalTransition(format!(
                "transaction {} is {}, expected {}",
                id, t.status, expected
            ))),
            None => Err(StoreError::IllegalTransition(format!(
                "transaction {} not found",
                id
            ))),
        }
    }

    async fn set_account_status(
        &mut self,
        id: AccountId,
        status: AccountStatus,
    ) -> Result<(), StoreError> {
        if !self.guard.accounts.contains_key(&id) {
            return Err(StoreError::Backend(format!("account {} not found", id)));
        }
        self.staged.account_status.push((id, status));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemUnit { mut guard, staged } = *self;

        for transfer in staged.transfers {
            guard
                .transfer_by_key
                .insert(transfer.idempotency_key.clone(), transfer.id);
            guard.transfers.insert(transfer.id, transfer);
        }
        guard.entries.extend(staged.entries);
        for (id, status) in staged.transfer_status {
            if let Some(t) = guard.transfers.get_mut(&id) {
                t.status = status;
            }
        }
        for (id, status) in staged.account_status {
            if let Some(a) = guard.accounts.get_mut(&id) {
                a.status = status;
            }
        }
        Ok(())
    }
}
