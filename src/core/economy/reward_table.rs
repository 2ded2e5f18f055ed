// Gacha reward table
//
// The fixed list of weighted outcomes a roll can land on. Each entry carries
// its effect explicitly so nothing downstream has to read meaning out of the
// display label.

use super::EconomyError;
use rand::Rng;
use serde::Serialize;

/// What a reward does to the roller's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardEffect {
    /// A prize handled outside the ledger (free pictures, discounts).
    Informational,
    /// Credit this many points back to the roller.
    GrantPoints(u64),
}

impl RewardEffect {
    /// Points credited by this effect, 0 for informational prizes.
    pub fn points(&self) -> u64 {
        match self {
            RewardEffect::Informational => 0,
            RewardEffect::GrantPoints(amount) => *amount,
        }
    }
}

/// One weighted entry in the reward table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub label: &'static str,
    pub weight: u32,
    pub effect: RewardEffect,
}

impl Reward {
    pub const fn informational(label: &'static str, weight: u32) -> Self {
        Self {
            label,
            weight,
            effect: RewardEffect::Informational,
        }
    }

    pub const fn points(label: &'static str, weight: u32, amount: u64) -> Self {
        Self {
            label,
            weight,
            effect: RewardEffect::GrantPoints(amount),
        }
    }
}

/// The reward set offered by the gacha machine. Weights sum to 100.
pub const STANDARD_REWARDS: [Reward; 9] = [
    Reward::informational("free 2 single pic", 5),
    Reward::informational("free 1 single pic", 5),
    Reward::informational("free 1 couple pic", 5),
    Reward::informational("discount 5%", 5),
    Reward::points("add point +100", 30, 100),
    Reward::points("add point +200", 20, 200),
    Reward::points("add point +300", 20, 300),
    Reward::points("add point +400", 5, 400),
    Reward::points("add point +500", 5, 500),
];

/// Weighted random selector over a static reward list.
#[derive(Debug, Clone)]
pub struct RewardTable {
    rewards: &'static [Reward],
    total_weight: u32,
}

impl RewardTable {
    /// Build a table, rejecting empty lists and zero weights.
    #[allow(dead_code)]
    pub fn new(rewards: &'static [Reward]) -> Result<Self, EconomyError> {
        if rewards.is_empty() {
            return Err(EconomyError::InvalidRewardTable(
                "reward table must not be empty".to_string(),
            ));
        }
        if let Some(reward) = rewards.iter().find(|r| r.weight == 0) {
            return Err(EconomyError::InvalidRewardTable(format!(
                "reward '{}' has zero weight",
                reward.label
            )));
        }

        let total_weight = rewards
            .iter()
            .try_fold(0u32, |acc, r| acc.checked_add(r.weight))
            .ok_or_else(|| {
                EconomyError::InvalidRewardTable("total weight overflows".to_string())
            })?;

        Ok(Self {
            rewards,
            total_weight,
        })
    }

    /// The table the bot ships with.
    pub fn standard() -> Self {
        Self {
            rewards: &STANDARD_REWARDS,
            total_weight: STANDARD_REWARDS.iter().map(|r| r.weight).sum(),
        }
    }

    #[allow(dead_code)]
    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    #[allow(dead_code)]
    pub fn rewards(&self) -> &'static [Reward] {
        self.rewards
    }

    /// Draw one reward. `r` is uniform in `[0, total_weight)`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Reward {
        let r = rng.gen_range(0.0..f64::from(self.total_weight));
        self.pick(r)
    }

    /// Walk the table in declaration order and return the first entry whose
    /// running upper bound reaches `r`.
    ///
    /// The comparison is inclusive, so a value sitting exactly on a boundary
    /// belongs to the earlier entry.
    pub fn pick(&self, r: f64) -> Reward {
        let mut upto = 0.0;
        for reward in self.rewards {
            let weight = f64::from(reward.weight);
            if upto + weight >= r {
                return *reward;
            }
            upto += weight;
        }

        // Only reachable for r >= total_weight
        self.rewards[self.rewards.len() - 1]
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self::standard()
    }
}
