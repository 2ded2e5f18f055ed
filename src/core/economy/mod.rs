// Economy module - domain logic for the gacha points ledger

mod economy_service;
pub mod notifications;
pub mod reward_table;

pub use economy_service::{BalanceStore, EconomyConfig, EconomyError, EconomyService, RollOutcome};
pub use notifications::{notify_best_effort, Notice, Notifier, NotifyError};
pub use reward_table::{Reward, RewardEffect, RewardTable, STANDARD_REWARDS};
