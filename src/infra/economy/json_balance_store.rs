use crate::core::economy::{BalanceStore, EconomyError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

/// JSON-backed balance store. The whole ledger lives in one file as a flat map:
/// { "<user_id>": points }
pub struct JsonBalanceStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<String, u64>>,
    write_lock: Mutex<()>,
}

impl JsonBalanceStore {
    /// Load the snapshot at `path`. A missing file is an empty ledger; anything
    /// that exists but doesn't parse is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, EconomyError> {
        let path = path.into();
        let cache = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                EconomyError::MalformedSnapshot(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(EconomyError::MalformedSnapshot(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(path = %path.display(), users = cache.len(), "Loaded balance snapshot");

        Ok(Self {
            path,
            cache: RwLock::new(cache),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl BalanceStore for JsonBalanceStore {
    async fn lookup(&self, user_id: &str) -> Option<u64> {
        let cache = self.cache.read().await;
        cache.get(user_id).copied()
    }

    async fn set(&self, user_id: &str, points: u64) {
        let mut cache = self.cache.write().await;
        cache.insert(user_id.to_string(), points);
    }

    async fn remove(&self, user_id: &str) {
        let mut cache = self.cache.write().await;
        cache.remove(user_id);
    }

    async fn persist(&self) -> Result<(), EconomyError> {
        let _write = self.write_lock.lock().await;

        let bytes = {
            let cache = self.cache.read().await;
            serde_json::to_vec_pretty(&*cache)
                .map_err(|e| EconomyError::Persistence(e.to_string()))?
        };

        // Write beside the snapshot and swap it in so a crash never leaves half a file
        let tmp = self.temp_path();
        std::fs::write(&tmp, bytes).map_err(|e| {
            EconomyError::Persistence(format!("{}: {}", tmp.display(), e))
        })?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp snapshot");
            }
            return Err(EconomyError::Persistence(format!(
                "{}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }
}
