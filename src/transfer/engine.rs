//! Transfer Engine
//!
//! Moves funds between two accounts: validation, authorization,
//! idempotency, then an atomic balance-check-then-post window inside one
//! storage unit of work. Every successful transfer writes exactly one
//! transaction record and one DEBIT/CREDIT ledger pair.
//!
//! # Flow
//!
//! ```text
//! Requested → Validated → Reserved → Posted → Completed
//!                 ↓           ↓         ↓
//!               Failed ←──────┴─────────┘
//! ```
//!
//! Replays of a known idempotency key short-circuit before the unit
//! opens. Business rejections (inactive account, insufficient funds)
//! abort before the PENDING insert, so the key stays unused and the
//! caller may retry. Infrastructure failures after the PENDING insert
//! roll back the unit and then record a FAILED transaction for the key
//! on a best-effort basis.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core_types::{TransferId, UserId};
use crate::error::LedgerError;
use crate::ledger::EntryPair;
use crate::money;
use crate::notify::{NotificationSink, NotifyEvent};
use crate::store::{LedgerStore, StoreError};

use super::status::{TransferKind, TransferStatus};
use super::types::{
    Actor, Transfer, TransferOutcome, TransferRequest, MAX_IDEMPOTENCY_KEY_LEN,
};

/// How a posting attempt ended short of success
enum PostError {
    /// Rejected before any transaction row was written; the key stays unused
    BeforeRecord(LedgerError),
    /// The PENDING insert lost the idempotency race to a concurrent call
    Raced,
    /// Failure after the PENDING insert; the unit rolled back
    AfterRecord(LedgerError),
}

/// The transfer engine
///
/// Stateless apart from its storage and notification handles; every
/// invariant lives in the storage unit of work.
pub struct TransferEngine {
    store: Arc<dyn LedgerStore>,
    sink: Arc<dyn NotificationSink>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn LedgerStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    /// Execute a transfer request for the given actor.
    ///
    /// Returns the transaction record wrapped in an outcome that tells
    /// replays apart from fresh work. Errors follow the domain taxonomy;
    /// `InsufficientFunds` and friends never leave a row behind.
    pub async fn transfer(
        &self,
        req: TransferRequest,
        actor: Actor,
    ) -> Result<TransferOutcome, LedgerError> {
        // === Validation ===
        Self::validate(&req)?;

        // === Authorization (per kind) ===
        let (from_owner, to_owner) = self.authorize(&req, actor).await?;

        // === Idempotency short-circuit ===
        if let Some(existing) = self.store.transfer_by_key(&req.idempotency_key).await? {
            info!(
                key = %req.idempotency_key,
                transaction_id = %existing.id,
                status = %existing.status,
                "🔄 IDEMPOTENCY: key seen before, answering with original record"
            );
            return Self::replay_outcome(existing);
        }

        // === Atomic check-then-post ===
        match self.post(&req).await {
            Ok(transfer) => {
                info!(
                    transaction_id = %transfer.id,
                    amount = %transfer.amount,
                    kind = %transfer.kind,
                    "Transfer completed: {} -> {}",
                    transfer.from_account,
                    transfer.to_account
                );
                self.notify_completed(&transfer, from_owner, to_owner);
                Ok(TransferOutcome::Completed(transfer))
            }
            Err(PostError::Raced) => {
                // A concurrent call with the same key won the insert.
                // Answer with the winner's record state, same as a replay.
                match self.store.transfer_by_key(&req.idempotency_key).await? {
                    Some(existing) => {
                        info!(
                            key = %req.idempotency_key,
                            transaction_id = %existing.id,
                            "Lost idempotency race, answering with winner's record"
                        );
                        Self::replay_outcome(existing)
                    }
                    // Winner rolled back between its insert and our read
                    None => Err(LedgerError::Persistence(
                        "idempotency race left no visible record; retry".to_string(),
                    )),
                }
            }
            Err(PostError::BeforeRecord(err)) => {
                debug!(key = %req.idempotency_key, error = %err, "Transfer rejected before posting");
                Err(err)
            }
            Err(PostError::AfterRecord(err)) => {
                warn!(key = %req.idempotency_key, error = %err, "Transfer aborted after PENDING insert");
                if let Some(failed) = self.record_failed(&req).await {
                    self.notify_failed(&failed, from_owner);
                }
                Err(err)
            }
        }
    }

    // === Step 1: Validate ===

    fn validate(req: &TransferRequest) -> Result<(), LedgerError> {
        if req.idempotency_key.is_empty() {
            return Err(LedgerError::InvalidRequest(
                "idempotencyKey is required".to_string(),
            ));
        }
        if req.idempotency_key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(LedgerError::InvalidRequest(format!(
                "idempotencyKey exceeds {} characters",
                MAX_IDEMPOTENCY_KEY_LEN
            )));
        }
        if req.from_account == req.to_account {
            return Err(LedgerError::InvalidRequest(
                "fromAccount and toAccount must differ".to_string(),
            ));
        }
        money::validate_amount(req.amount)?;
        Ok(())
    }

    // === Step 2: Authorize ===

    /// Per-kind authorization predicate. Both kinds share the posting
    /// path below; only this gate differs.
    ///
    /// Returns the owner ids of both accounts for post-commit
    /// notifications. Ownership violations answer `AccountNotFound`, not
    /// `Forbidden`, so callers learn nothing about foreign accounts.
    async fn authorize(
        &self,
        req: &TransferRequest,
        actor: Actor,
    ) -> Result<(UserId, UserId), LedgerError> {
        let from = self
            .store
            .account(req.from_account)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;
        let to = self
            .store
            .account(req.to_account)
            .await?
            .ok_or(LedgerError::AccountNotFound)?;

        match req.kind {
            TransferKind::Peer => {
                if from.owner_id != actor.user_id || to.owner_id != actor.user_id {
                    return Err(LedgerError::AccountNotFound);
                }
            }
            TransferKind::SystemFunding => {
                if !actor.is_system {
                    return Err(LedgerError::Forbidden);
                }
                // The source must be the system user's own account
                if from.owner_id != actor.user_id {
                    return Err(LedgerError::AccountNotFound);
                }
            }
        }

        Ok((from.owner_id, to.owner_id))
    }

    // === Steps 4-9: atomic check-then-post ===

    /// One unit of work: lock both accounts, re-check status, check the
    /// source balance, insert PENDING, append the pair, mark COMPLETED,
    /// commit. Any early return drops the unit and rolls back.
    async fn post(&self, req: &TransferRequest) -> Result<Transfer, PostError> {
        let mut unit = self
            .store
            .begin()
            .await
            .map_err(|e| PostError::BeforeRecord(e.into()))?;

        // Lock both account rows in ascending id order so concurrent
        // transfers over the same pair cannot deadlock.
        let mut ordered = [req.from_account, req.to_account];
        ordered.sort();
        let mut locked = Vec::with_capacity(2);
        for id in ordered {
            let account = unit
                .lock_account(id)
                .await
                .map_err(|e| PostError::BeforeRecord(e.into()))?
                .ok_or(PostError::BeforeRecord(LedgerError::AccountNotFound))?;
            locked.push(account);
        }

        // Status re-check under the lock: a concurrent close commits
        // either before this point (we see CLOSED) or after our commit.
        if locked.iter().any(|a| !a.is_active()) {
            return Err(PostError::BeforeRecord(LedgerError::AccountInactive));
        }

        // Balance gate for peer transfers. System funding mints from the
        // system account, which is the one account allowed to go negative.
        if req.kind == TransferKind::Peer {
            let balance = unit
                .balance_of(req.from_account)
                .await
                .map_err(|e| PostError::BeforeRecord(e.into()))?;
            if balance < req.amount {
                return Err(PostError::BeforeRecord(LedgerError::InsufficientFunds {
                    balance,
                    requested: req.amount,
                }));
            }
        }

        // PENDING record under the storage uniqueness constraint
        let transfer = Transfer {
            id: TransferId::new(),
            from_account: req.from_account,
            to_account: req.to_account,
            amount: req.amount,
            idempotency_key: req.idempotency_key.clone(),
            status: TransferStatus::Pending,
            kind: req.kind,
            created_at: Utc::now(),
        };
        match unit.insert_transfer(&transfer).await {
            Ok(()) => {}
            Err(StoreError::DuplicateKey) => return Err(PostError::Raced),
            Err(e) => return Err(PostError::BeforeRecord(e.into())),
        }

        // Ledger pair and completion in the same unit
        let pair = EntryPair::post(req.from_account, req.to_account, req.amount, transfer.id);
        unit.append_pair(&pair)
            .await
            .map_err(|e| PostError::AfterRecord(e.into()))?;
        unit.set_transfer_status(transfer.id, TransferStatus::Pending, TransferStatus::Completed)
            .await
            .map_err(|e| PostError::AfterRecord(e.into()))?;
        unit.commit()
            .await
            .map_err(|e| PostError::AfterRecord(e.into()))?;

        Ok(Transfer {
            status: TransferStatus::Completed,
            ..transfer
        })
    }

    /// Map a pre-existing record for the key onto the caller's answer
    fn replay_outcome(existing: Transfer) -> Result<TransferOutcome, LedgerError> {
        match existing.status {
            TransferStatus::Completed => Ok(TransferOutcome::Replayed(existing)),
            TransferStatus::Pending => Ok(TransferOutcome::InProgress(existing)),
            // Terminal failures consume the key for good
            TransferStatus::Failed | TransferStatus::Reversed => {
                Err(LedgerError::KeyConsumed(existing.status))
            }
        }
    }

    /// Record a FAILED transaction for the key after an aborted posting.
    ///
    /// The aborted unit rolled its PENDING row back, so this opens a
    /// fresh unit. Best-effort: when even this write fails, no record is
    /// visible and the key retries cleanly.
    async fn record_failed(&self, req: &TransferRequest) -> Option<Transfer> {
        let transfer = Transfer {
            id: TransferId::new(),
            from_account: req.from_account,
            to_account: req.to_account,
            amount: req.amount,
            idempotency_key: req.idempotency_key.clone(),
            status: TransferStatus::Failed,
            kind: req.kind,
            created_at: Utc::now(),
        };

        let result: Result<(), StoreError> = async {
            let mut unit = self.store.begin().await?;
            let mut pending = transfer.clone();
            pending.status = TransferStatus::Pending;
            unit.insert_transfer(&pending).await?;
            unit.set_transfer_status(transfer.id, TransferStatus::Pending, TransferStatus::Failed)
                .await?;
            unit.commit().await
        }
        .await;

        match result {
            Ok(()) => {
                info!(
                    transaction_id = %transfer.id,
                    key = %transfer.idempotency_key,
                    "Recorded FAILED transaction for aborted transfer"
                );
                Some(transfer)
            }
            Err(e) => {
                warn!(
                    key = %transfer.idempotency_key,
                    error = %e,
                    "Could not record FAILED transaction; key will retry clean"
                );
                None
            }
        }
    }

    // === Step 10: Notify (after commit, never blocking) ===

    fn notify_completed(&self, transfer: &Transfer, from_owner: UserId, to_owner: UserId) {
        let mut owners = vec![to_owner];
        if from_owner != to_owner {
            owners.push(from_owner);
        }
        self.spawn_notify(transfer.clone(), owners, true);
    }

    fn notify_failed(&self, transfer: &Transfer, from_owner: UserId) {
        self.spawn_notify(transfer.clone(), vec![from_owner], false);
    }

    fn spawn_notify(&self, transfer: Transfer, owners: Vec<UserId>, completed: bool) {
        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            for owner in owners {
                let user = match store.user_by_id(owner).await {
                    Ok(Some(user)) => user,
                    Ok(None) => {
                        warn!(owner_id = owner, "Transfer party has no user row, skipping notification");
                        continue;
                    }
                    Err(e) => {
                        warn!(owner_id = owner, error = %e, "User lookup for notification failed");
                        continue;
                    }
                };

                let event = if completed {
                    NotifyEvent::TransferCompleted {
                        email: user.email,
                        name: user.name,
                        transfer: transfer.clone(),
                    }
                } else {
                    NotifyEvent::TransferFailed {
                        email: user.email,
                        name: user.name,
                        transfer: transfer.clone(),
                    }
                };

                if let Err(e) = sink.notify(event).await {
                    warn!(error = %e, "Notification delivery failed");
                }
            }
        });
    }
}
