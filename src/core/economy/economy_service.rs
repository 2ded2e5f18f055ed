// Economy system core - business logic for gacha points
//
// This module contains all the domain logic for the points ledger.
// It is platform-agnostic: it works with plain string user ids and knows
// nothing about how commands reach it.

use super::{Reward, RewardTable};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex as StdMutex;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Result of a successful roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    pub reward: Reward,
    /// Balance after the cost was deducted and any reward credited.
    pub balance: u64,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EconomyError {
    #[error("Insufficient funds: need {required} points, but only have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("Balance overflow: {balance} + {credit} does not fit")]
    BalanceOverflow { balance: u64, credit: u64 },

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Malformed balance snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Invalid reward table: {0}")]
    InvalidRewardTable(String),
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Durable user id -> points map with whole-snapshot persistence.
///
/// Stores do no validation of their own. Every mutation goes through
/// [`EconomyService`], which keeps balances consistent.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Stored balance, or `None` if the user has never been seen.
    async fn lookup(&self, user_id: &str) -> Option<u64>;

    /// Stored balance, 0 for unknown users.
    async fn get(&self, user_id: &str) -> u64 {
        self.lookup(user_id).await.unwrap_or(0)
    }

    /// Insert or overwrite a balance in memory.
    async fn set(&self, user_id: &str, points: u64);

    /// Forget a user entirely. Only used to undo a first write.
    async fn remove(&self, user_id: &str);

    /// Write the whole current map to durable storage.
    async fn persist(&self) -> Result<(), EconomyError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the economy system.
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// Points deducted per roll.
    pub roll_cost: u64,

    /// Largest absolute amount a single admin grant may move.
    pub max_grant: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            roll_cost: 300,
            max_grant: 1_000_000,
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The main service for economy operations.
///
/// Generic over S: BalanceStore so we can swap implementations.
pub struct EconomyService<S: BalanceStore> {
    store: S,
    config: EconomyConfig,
    rewards: RewardTable,
    rng: StdMutex<StdRng>,
    /// Held for the full read-modify-persist cycle of every mutation.
    tx_lock: Mutex<()>,
}

impl<S: BalanceStore> EconomyService<S> {
    /// Create a new economy service with the given store.
    pub fn new(store: S) -> Self {
        Self::new_with_config(store, EconomyConfig::default())
    }

    /// Create a new economy service with custom configuration.
    pub fn new_with_config(store: S, config: EconomyConfig) -> Self {
        Self {
            store,
            config,
            rewards: RewardTable::standard(),
            rng: StdMutex::new(StdRng::from_entropy()),
            tx_lock: Mutex::new(()),
        }
    }

    /// Replace the reward table.
    pub fn with_rewards(mut self, rewards: RewardTable) -> Self {
        self.rewards = rewards;
        self
    }

    /// Use a deterministic RNG.
    #[allow(dead_code)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdMutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Get a user's current balance.
    pub async fn balance(&self, user_id: &str) -> u64 {
        self.store.get(user_id).await
    }

    /// Spend `roll_cost` points, draw a reward and credit it if it grants points.
    ///
    /// The deduction and credit are applied as one net change and persisted once.
    pub async fn roll(&self, user_id: &str) -> Result<RollOutcome, EconomyError> {
        let _tx = self.tx_lock.lock().await;

        let previous = self.store.lookup(user_id).await;
        let balance = previous.unwrap_or(0);
        let cost = self.config.roll_cost;

        if balance < cost {
            tracing::debug!(user_id, balance, cost, "Roll rejected");
            return Err(EconomyError::InsufficientFunds {
                required: cost,
                available: balance,
            });
        }

        let reward = self.draw_reward();
        let credit = reward.effect.points();
        let new_balance = (balance - cost).checked_add(credit).ok_or(
            EconomyError::BalanceOverflow {
                balance: balance - cost,
                credit,
            },
        )?;

        self.commit(user_id, previous, new_balance).await?;

        tracing::info!(
            user_id,
            reward = reward.label,
            old_balance = balance,
            new_balance,
            "Gacha roll"
        );

        Ok(RollOutcome {
            reward,
            balance: new_balance,
        })
    }

    /// Administrative credit. Negative amounts debit, but never below zero.
    pub async fn grant(&self, user_id: &str, amount: i64) -> Result<u64, EconomyError> {
        if amount == 0 || amount.unsigned_abs() > self.config.max_grant {
            return Err(EconomyError::InvalidAmount(amount));
        }

        let _tx = self.tx_lock.lock().await;

        let previous = self.store.lookup(user_id).await;
        let balance = previous.unwrap_or(0);

        let new_balance = match balance.checked_add_signed(amount) {
            Some(value) => value,
            None if amount < 0 => {
                return Err(EconomyError::InsufficientFunds {
                    required: amount.unsigned_abs(),
                    available: balance,
                })
            }
            None => {
                return Err(EconomyError::BalanceOverflow {
                    balance,
                    credit: amount.unsigned_abs(),
                })
            }
        };

        self.commit(user_id, previous, new_balance).await?;

        tracing::info!(
            user_id,
            amount,
            old_balance = balance,
            new_balance,
            "Points granted"
        );

        Ok(new_balance)
    }

    fn draw_reward(&self) -> Reward {
        // A panic elsewhere can't leave the RNG in a bad state, so poisoning is ignored
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        self.rewards.draw(&mut *rng)
    }

    /// Write a new balance and persist it, restoring the old value if the
    /// write fails. Caller must hold `tx_lock`.
    async fn commit(
        &self,
        user_id: &str,
        previous: Option<u64>,
        new_balance: u64,
    ) -> Result<(), EconomyError> {
        self.store.set(user_id, new_balance).await;

        if let Err(e) = self.store.persist().await {
            match previous {
                Some(points) => self.store.set(user_id, points).await,
                None => self.store.remove(user_id).await,
            }
            tracing::error!(user_id, error = %e, "Failed to persist balance, change rolled back");
            return Err(e);
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
