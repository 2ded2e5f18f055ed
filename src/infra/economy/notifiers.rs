// Notifier implementations.

use crate::core::economy::{Notice, Notifier, NotifyError};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Emits every notice as a structured log event.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        match notice {
            Notice::RollReceipt {
                user_id,
                reward,
                balance,
            } => {
                tracing::info!(user_id = %user_id, reward = reward.label, balance, "Roll receipt");
            }
            Notice::GachaLog {
                user_id,
                reward,
                at,
            } => {
                tracing::info!(user_id = %user_id, reward = reward.label, at = %at, "Gacha log");
            }
            Notice::PointsGranted {
                user_id,
                amount,
                balance,
            } => {
                tracing::info!(user_id = %user_id, amount, balance, "Points granted notice");
            }
        }
        Ok(())
    }
}

/// Owner-facing audit trail: one JSON line per roll, appended to a file.
/// Other notices are ignored.
pub struct GachaLogFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl GachaLogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl Notifier for GachaLogFile {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        if !matches!(notice, Notice::GachaLog { .. }) {
            return Ok(());
        }

        let mut line = serde_json::to_vec(notice)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::economy::STANDARD_REWARDS;
    use chrono::Utc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_gacha_log_appends_only_log_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gacha_log.jsonl");
        let log = GachaLogFile::new(&path);

        log.notify(&Notice::GachaLog {
            user_id: "1".to_string(),
            reward: STANDARD_REWARDS[0],
            at: Utc::now(),
        })
        .await
        .unwrap();
        log.notify(&Notice::RollReceipt {
            user_id: "1".to_string(),
            reward: STANDARD_REWARDS[0],
            balance: 0,
        })
        .await
        .unwrap();
        log.notify(&Notice::GachaLog {
            user_id: "2".to_string(),
            reward: STANDARD_REWARDS[8],
            at: Utc::now(),
        })
        .await
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["user_id"], "1");
        assert_eq!(lines[1]["reward"]["label"], "add point +500");
    }

    #[tokio::test]
    async fn test_gacha_log_reports_io_errors() {
        let dir = tempdir().unwrap();
        let log = GachaLogFile::new(dir.path().join("nope").join("log.jsonl"));

        let result = log
            .notify(&Notice::GachaLog {
                user_id: "1".to_string(),
                reward: STANDARD_REWARDS[0],
                at: Utc::now(),
            })
            .await;
        assert!(matches!(result, Err(NotifyError::Io(_))));
    }
}
