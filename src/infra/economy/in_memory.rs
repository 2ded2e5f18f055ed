// In-memory implementation of BalanceStore.
//
// Nothing is written to disk: `persist` always succeeds. Used for dry runs
// (empty DATA_FILE) and for exercising the dispatcher in tests.

use crate::core::economy::{BalanceStore, EconomyError};
use async_trait::async_trait;
use dashmap::DashMap;

/// Balances keyed by user id in a concurrent map.
#[derive(Default)]
pub struct InMemoryBalanceStore {
    balances: DashMap<String, u64>,
}

impl InMemoryBalanceStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn lookup(&self, user_id: &str) -> Option<u64> {
        self.balances.get(user_id).map(|entry| *entry)
    }

    async fn set(&self, user_id: &str, points: u64) {
        self.balances.insert(user_id.to_string(), points);
    }

    async fn remove(&self, user_id: &str) {
        self.balances.remove(user_id);
    }

    async fn persist(&self) -> Result<(), EconomyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryBalanceStore::new();

        // Initially, user should have 0 points
        assert_eq!(store.get("123").await, 0);
        assert_eq!(store.lookup("123").await, None);

        store.set("123", 100).await;
        assert_eq!(store.get("123").await, 100);

        store.set("123", 0).await;
        assert_eq!(store.lookup("123").await, Some(0));

        store.remove("123").await;
        assert_eq!(store.lookup("123").await, None);
        assert!(store.persist().await.is_ok());
    }
}
