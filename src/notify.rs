//! Notification Sink
//!
//! Best-effort outbound notifications for transfer outcomes. The engine
//! fires these after commit; a sink failure is logged and swallowed, it
//! never rolls back or delays a transfer.
//!
//! Mail delivery mechanics stay outside this crate. The production sink
//! emits structured log lines that a mailer daemon can tail.

use async_trait::async_trait;

use crate::transfer::Transfer;

/// One outbound notification
#[derive(Debug, Clone)]
pub enum NotifyEvent {
    /// Transfer committed; sent to both parties
    TransferCompleted {
        email: String,
        name: String,
        transfer: Transfer,
    },
    /// Transfer attempt recorded as FAILED
    TransferFailed {
        email: String,
        name: String,
        transfer: Transfer,
    },
}

impl NotifyEvent {
    /// Recipient address
    pub fn email(&self) -> &str {
        match self {
            NotifyEvent::TransferCompleted { email, .. }
            | NotifyEvent::TransferFailed { email, .. } => email,
        }
    }
}

/// Delivery seam for outbound notifications
///
/// Implementations must be idempotent-tolerant: the engine may retry a
/// send after a transient failure and duplicates are acceptable.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: NotifyEvent) -> anyhow::Result<()>;
}

/// Production sink: structured log lines in place of SMTP
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, event: NotifyEvent) -> anyhow::Result<()> {
        match &event {
            NotifyEvent::TransferCompleted { email, transfer, .. } => {
                tracing::info!(
                    email = %email,
                    transaction_id = %transfer.id,
                    amount = %transfer.amount,
                    "notify: transfer completed"
                );
            }
            NotifyEvent::TransferFailed { email, transfer, .. } => {
                tracing::warn!(
                    email = %email,
                    transaction_id = %transfer.id,
                    amount = %transfer.amount,
                    "notify: transfer failed"
                );
            }
        }
        Ok(())
    }
}


#[cfg(test)]
pub use capture::CaptureSink;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{AccountId, TransferId};
    use crate::transfer::{TransferKind, TransferStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn completed_event() -> NotifyEvent {
        NotifyEvent::TransferCompleted {
            email: "bob@test".to_string(),
            name: "Bob".to_string(),
            transfer: Transfer {
                id: TransferId::new(),
                from_account: AccountId::new(),
                to_account: AccountId::new(),
                amount: Decimal::from(50),
                idempotency_key: "k".to_string(),
                status: TransferStatus::Completed,
                kind: TransferKind::Peer,
                created_at: Utc::now(),
            },
        }
    }

    fn failed_event() -> NotifyEvent {
        match completed_event() {
            NotifyEvent::TransferCompleted {
                email,
                name,
                transfer,
            } => NotifyEvent::TransferFailed {
                email,
                name,
                transfer,
            },
            other => other,
        }
    }

    #[tokio::test]
    async fn test_log_sink_never_fails() {
        let sink = LogSink;
        assert!(sink.notify(completed_event()).await.is_ok());
        assert!(sink.notify(failed_event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_capture_sink_records_events() {
        let sink = CaptureSink::new();
        sink.notify(completed_event()).await.unwrap();
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.events()[0].email(), "bob@test");

        sink.set_fail(true);
        assert!(sink.notify(completed_event()).await.is_err());
        assert_eq!(sink.count(), 1);
    }
}
