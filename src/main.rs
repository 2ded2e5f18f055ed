// This is the entry point of the gacha points bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (ledger, reward table, transactions)
// - `infra/` = Implementations of core traits (JSON snapshot, notifiers)
// - `console/` = Line-based command dispatcher
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Feed incoming commands to the dispatcher

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "console/console_layer.rs"]
mod console;
#[path = "infra/infra_layer.rs"]
mod infra;
mod config;

use crate::config::Settings;
use crate::console::{handle_line, Data};
use crate::core::economy::{BalanceStore, EconomyService, Notifier};
use crate::infra::economy::{GachaLogFile, InMemoryBalanceStore, JsonBalanceStore, TracingNotifier};
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Read commands from stdin until EOF, printing one reply per command.
async fn run<S: BalanceStore>(data: Data<S>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if let Some(reply) = handle_line(&data, &line).await {
            println!("{}", reply);
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists), before logging
    // so RUST_LOG can come from there too
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;

    // Keep runtime data in a dedicated folder so the repo root stays tidy.
    for path in settings.data_file.iter().chain([&settings.gacha_log_file]) {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        }
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let notifiers: Vec<Arc<dyn Notifier>> = vec![
        Arc::new(TracingNotifier),
        Arc::new(GachaLogFile::new(&settings.gacha_log_file)),
    ];

    tracing::info!(
        owner_id = %settings.owner_id,
        roll_cost = settings.economy.roll_cost,
        "🎰 Gacha bot is ready"
    );

    match &settings.data_file {
        Some(path) => {
            // A corrupt snapshot needs an operator, so refuse to start
            let store = JsonBalanceStore::load(path).context("Failed to load balance snapshot")?;
            tracing::info!(path = %store.path().display(), "Using JSON balance snapshot");
            let economy = EconomyService::new_with_config(store, settings.economy.clone());
            run(Data {
                economy: Arc::new(economy),
                notifiers,
                owner_id: settings.owner_id.clone(),
            })
            .await
        }
        None => {
            tracing::warn!("DATA_FILE is empty, balances will not be saved");
            let economy =
                EconomyService::new_with_config(InMemoryBalanceStore::new(), settings.economy.clone());
            run(Data {
                economy: Arc::new(economy),
                notifiers,
                owner_id: settings.owner_id.clone(),
            })
            .await
        }
    }
}
