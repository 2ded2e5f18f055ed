// Runtime configuration, read from the environment (and `.env` via dotenv in main).

use crate::core::economy::EconomyConfig;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

const DEFAULT_DATA_FILE: &str = "data/data.json";
const DEFAULT_GACHA_LOG_FILE: &str = "data/gacha_log.jsonl";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Balance snapshot. `None` keeps the ledger in memory only.
    pub data_file: Option<PathBuf>,
    pub gacha_log_file: PathBuf,
    /// Only this user may grant points.
    pub owner_id: String,
    pub economy: EconomyConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let owner_id = lookup("OWNER_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("Missing OWNER_ID environment variable"))?;

        // An explicitly empty DATA_FILE means a throwaway in-memory ledger
        let data_file = match lookup("DATA_FILE") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
            None => Some(PathBuf::from(DEFAULT_DATA_FILE)),
        };

        let gacha_log_file = lookup("GACHA_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GACHA_LOG_FILE));

        let defaults = EconomyConfig::default();
        let roll_cost = parse_or(&lookup, "ROLL_COST", defaults.roll_cost)?;
        let max_grant = parse_or(&lookup, "MAX_GRANT", defaults.max_grant)?;

        Ok(Self {
            data_file,
            gacha_log_file,
            owner_id,
            economy: EconomyConfig {
                roll_cost,
                max_grant,
            },
        })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{} must be a non-negative integer, got '{}'", key, raw)),
        None => Ok(default),
    }
}
