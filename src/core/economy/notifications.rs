// Notifications about completed economy transactions.
//
// These are fire-and-forget: a receipt that fails to deliver must never undo
// or block a balance change that has already been persisted.

use super::Reward;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Something worth telling a user or the server owner about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Sent to the roller after a successful roll.
    RollReceipt {
        user_id: String,
        reward: Reward,
        balance: u64,
    },
    /// Audit entry for the server owner.
    GachaLog {
        user_id: String,
        reward: Reward,
        at: DateTime<Utc>,
    },
    /// Confirmation of an administrative grant.
    PointsGranted {
        user_id: String,
        amount: i64,
        balance: u64,
    },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError>;
}

/// Deliver a notice, logging instead of propagating any failure.
pub async fn notify_best_effort(notifier: &dyn Notifier, notice: Notice) {
    if let Err(e) = notifier.notify(&notice).await {
        tracing::warn!(error = %e, ?notice, "Failed to deliver notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenNotifier {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for BrokenNotifier {
        async fn notify(&self, _notice: &Notice) -> Result<(), NotifyError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifyError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "owner has DMs closed",
            )))
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let notifier = BrokenNotifier {
            attempts: AtomicUsize::new(0),
        };

        notify_best_effort(
            &notifier,
            Notice::PointsGranted {
                user_id: "42".to_string(),
                amount: 50,
                balance: 50,
            },
        )
        .await;

        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notice_serializes_with_kind_tag() {
        let notice = Notice::GachaLog {
            user_id: "7".to_string(),
            reward: crate::core::economy::STANDARD_REWARDS[4],
            at: Utc::now(),
        };
        let value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value["kind"], "gacha_log");
        assert_eq!(value["reward"]["label"], "add point +100");
        assert_eq!(value["reward"]["effect"]["grant_points"], 100);
    }
}
