//! Account Registry
//!
//! Account identity and lifecycle. Balances are always derived from the
//! ledger at read time; this module never writes a transaction or a
//! ledger entry, it only reads them and flips `Account::status`.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::account::{Account, AccountStatus};
use crate::core_types::{AccountId, UserId};
use crate::error::LedgerError;
use crate::store::LedgerStore;

pub struct AccountRegistry {
    store: Arc<dyn LedgerStore>,
}

impl AccountRegistry {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open a new ACTIVE account for the owner. No balance side effects;
    /// welcome funding is a separate transfer call.
    pub async fn open_account(&self, owner: UserId) -> Result<Account, LedgerError> {
        let account = Account::open(owner);
        self.store.insert_account(&account).await?;
        info!(account_id = %account.id, owner_id = owner, "Account opened");
        Ok(account)
    }

    /// All accounts owned by the caller
    pub async fn accounts_for(&self, owner: UserId) -> Result<Vec<Account>, LedgerError> {
        Ok(self.store.accounts_for_owner(owner).await?)
    }

    /// Derived balance for one of the requester's accounts.
    ///
    /// Foreign accounts answer `AccountNotFound`, same as missing ones.
    pub async fn balance(
        &self,
        id: AccountId,
        requester: UserId,
    ) -> Result<Decimal, LedgerError> {
        let account = self.owned(id, requester).await?;
        Ok(self.store.balance(account.id).await?)
    }

    /// Close an account: only when owned, ACTIVE, and the derived
    /// balance is exactly zero. CLOSED is terminal.
    ///
    /// The check-then-set runs under the account row lock, so a transfer
    /// racing this close either commits first (we see its balance) or
    /// observes CLOSED and rejects.
    pub async fn close_account(
        &self,
        id: AccountId,
        requester: UserId,
    ) -> Result<Account, LedgerError> {
        self.owned(id, requester).await?;

        let mut unit = self.store.begin().await?;
        let account = unit
            .lock_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;

        if account.status == AccountStatus::Closed {
            return Err(LedgerError::AlreadyClosed);
        }

        let balance = unit.balance_of(id).await?;
        if !balance.is_zero() {
            return Err(LedgerError::NonZeroBalance(balance));
        }

        unit.set_account_status(id, AccountStatus::Closed).await?;
        unit.commit().await?;

        info!(account_id = %id, "Account closed");
        Ok(Account {
            status: AccountStatus::Closed,
            ..account
        })
    }

    /// Resolve a transfer recipient: the ACTIVE accounts of the user
    /// owning `email`. The requester's own email is rejected; an unknown
    /// email answers `AccountNotFound`.
    pub async fn resolve_recipient(
        &self,
        email: &str,
        requester: UserId,
    ) -> Result<Vec<Account>, LedgerError> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;

        if user.user_id == requester {
            return Err(LedgerError::InvalidRequest(
                "recipient email must not be your own".to_string(),
            ));
        }

        let accounts = self.store.accounts_for_owner(user.user_id).await?;
        Ok(accounts.into_iter().filter(Account::is_active).collect())
    }

    async fn owned(&self, id: AccountId, requester: UserId) -> Result<Account, LedgerError> {
        let account = self
            .store
            .account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        if account.owner_id != requester {
            return Err(LedgerError::AccountNotFound);
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::TransferId;
    use crate::ledger::EntryPair;
    use crate::store::{MemoryStore, NewUser};
    use crate::transfer::{Transfer, TransferKind, TransferStatus};
    use chrono::Utc;

    async fn harness() -> (AccountRegistry, Arc<MemoryStore>, UserId) {
        let store = Arc::new(MemoryStore::new());
        let registry = AccountRegistry::new(store.clone() as Arc<dyn LedgerStore>);
        let owner = store
            .insert_user(NewUser {
                email: "alice@test".to_string(),
                name: "Alice".to_string(),
                password_hash: "x".to_string(),
                is_system: false,
            })
            .await
            .unwrap()
            .user_id;
        (registry, store, owner)
    }

    /// Post a completed transfer directly through the store
    async fn seed_funds(store: &MemoryStore, from: AccountId, to: AccountId, amount: i64, key: &str) {
        let transfer = Transfer {
            id: TransferId::new(),
            from_account: from,
            to_account: to,
            amount: Decimal::from(amount),
            idempotency_key: key.to_string(),
            status: TransferStatus::Pending,
            kind: TransferKind::SystemFunding,
            created_at: Utc::now(),
        };
        let pair = EntryPair::post(from, to, transfer.amount, transfer.id);

        let mut unit = store.begin().await.unwrap();
        unit.insert_transfer(&transfer).await.unwrap();
        unit.append_pair(&pair).await.unwrap();
        unit.set_transfer_status(transfer.id, TransferStatus::Pending, TransferStatus::Completed)
            .await
            .unwrap();
        unit.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_and_list() {
        let (registry, _store, owner) = harness().await;

        let a = registry.open_account(owner).await.unwrap();
        let b = registry.open_account(owner).await.unwrap();
        assert!(a.is_active());
        assert_ne!(a.id, b.id);

        let accounts = registry.accounts_for(owner).await.unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[tokio::test]
    async fn test_balance_requires_ownership() {
        let (registry, store, owner) = harness().await;
        let account = registry.open_account(owner).await.unwrap();

        assert_eq!(
            registry.balance(account.id, owner).await.unwrap(),
            Decimal::ZERO
        );

        let stranger = store
            .insert_user(NewUser {
                email: "bob@test".to_string(),
                name: "Bob".to_string(),
                password_hash: "x".to_string(),
                is_system: false,
            })
            .await
            .unwrap()
            .user_id;
        let err = registry.balance(account.id, stranger).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }

    #[tokio::test]
    async fn test_close_zero_balance_account() {
        let (registry, _store, owner) = harness().await;
        let account = registry.open_account(owner).await.unwrap();

        let closed = registry.close_account(account.id, owner).await.unwrap();
        assert_eq!(closed.status, AccountStatus::Closed);

        // CLOSED is terminal
        let err = registry.close_account(account.id, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyClosed));
    }

    #[tokio::test]
    async fn test_close_rejects_non_zero_balance() {
        let (registry, store, owner) = harness().await;
        let funded = registry.open_account(owner).await.unwrap();
        let source = registry.open_account(owner).await.unwrap();
        seed_funds(&store, source.id, funded.id, 250, "seed").await;

        let err = registry.close_account(funded.id, owner).await.unwrap_err();
        assert!(matches!(err, LedgerError::NonZeroBalance(b) if b == Decimal::from(250)));

        // Still ACTIVE and still holding its balance
        let account = store.account(funded.id).await.unwrap().unwrap();
        assert!(account.is_active());
        assert_eq!(
            registry.balance(funded.id, owner).await.unwrap(),
            Decimal::from(250)
        );
    }

    #[tokio::test]
    async fn test_resolve_recipient() {
        let (registry, store, owner) = harness().await;

        let bob = store
            .insert_user(NewUser {
                email: "bob@test".to_string(),
                name: "Bob".to_string(),
                password_hash: "x".to_string(),
                is_system: false,
            })
            .await
            .unwrap()
            .user_id;
        let active = registry.open_account(bob).await.unwrap();
        let closed = registry.open_account(bob).await.unwrap();
        registry.close_account(closed.id, bob).await.unwrap();

        let resolved = registry.resolve_recipient("bob@test", owner).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, active.id);

        // Own email is not a recipient
        let err = registry
            .resolve_recipient("alice@test", owner)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));

        // Unknown email leaks nothing beyond not-found
        let err = registry
            .resolve_recipient("nobody@test", owner)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound));
    }
}
