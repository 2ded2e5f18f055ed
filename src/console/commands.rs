// Console commands for the gacha economy
//
// Same shape as a chat command handler:
// 1. Extract primitive data from the incoming line
// 2. Call core service
// 3. Format the reply

use crate::core::economy::{
    notify_best_effort, BalanceStore, EconomyError, EconomyService, Notice, Notifier,
    RollOutcome,
};
use chrono::Utc;
use std::sync::Arc;

/// Shared state handed to every command.
pub struct Data<S: BalanceStore> {
    pub economy: Arc<EconomyService<S>>,
    pub notifiers: Vec<Arc<dyn Notifier>>,
    pub owner_id: String,
}

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Roll,
    Points(Option<String>),
    AddPoints { user_id: String, amount: i64 },
    Help,
}

pub const USAGE: &str = "usage: <actor_id> roll | <actor_id> points [user_id] | <actor_id> addpoints <user_id> <amount> | <actor_id> help";

/// Split a line into the acting user and their command.
///
/// Returns `Ok(None)` for blank lines and `Err` with a reply for bad input.
pub fn parse_line(line: &str) -> Result<Option<(String, Command)>, String> {
    let mut parts = line.split_whitespace();
    let Some(actor) = parts.next() else {
        return Ok(None);
    };
    let name = parts.next().map(str::to_ascii_lowercase);
    let args: Vec<&str> = parts.collect();

    let command = match (name.as_deref(), args.as_slice()) {
        (Some("roll"), []) => Command::Roll,
        (Some("points"), []) => Command::Points(None),
        (Some("points"), [user]) => Command::Points(Some(user.to_string())),
        (Some("addpoints"), [user, amount]) => {
            let amount = amount
                .parse::<i64>()
                .map_err(|_| format!("❌ '{}' is not a whole number", amount))?;
            Command::AddPoints {
                user_id: user.to_string(),
                amount,
            }
        }
        (Some("help"), _) | (None, _) => Command::Help,
        _ => return Err(USAGE.to_string()),
    };

    Ok(Some((actor.to_string(), command)))
}

/// Handle one input line, returning the reply to print (if any).
pub async fn handle_line<S: BalanceStore>(data: &Data<S>, line: &str) -> Option<String> {
    match parse_line(line) {
        Ok(Some((actor, command))) => Some(execute(data, &actor, command).await),
        Ok(None) => None,
        Err(reply) => Some(reply),
    }
}

pub async fn execute<S: BalanceStore>(data: &Data<S>, actor: &str, command: Command) -> String {
    match command {
        Command::Roll => roll(data, actor).await,
        Command::Points(user) => {
            let user_id = user.as_deref().unwrap_or(actor);
            let points = data.economy.balance(user_id).await;
            format!("💎 {} has {} points", user_id, points)
        }
        Command::AddPoints { user_id, amount } => add_points(data, actor, &user_id, amount).await,
        Command::Help => format!(
            "🎰 Gacha machine: roll costs {} points\n{}",
            data.economy.config().roll_cost,
            USAGE
        ),
    }
}

async fn notify_all<S: BalanceStore>(data: &Data<S>, notice: Notice) {
    for notifier in &data.notifiers {
        notify_best_effort(notifier.as_ref(), notice.clone()).await;
    }
}

async fn roll<S: BalanceStore>(data: &Data<S>, actor: &str) -> String {
    match data.economy.roll(actor).await {
        Ok(outcome) => {
            notify_all(
                data,
                Notice::RollReceipt {
                    user_id: actor.to_string(),
                    reward: outcome.reward,
                    balance: outcome.balance,
                },
            )
            .await;
            notify_all(
                data,
                Notice::GachaLog {
                    user_id: actor.to_string(),
                    reward: outcome.reward,
                    at: Utc::now(),
                },
            )
            .await;

            roll_reply(&outcome)
        }
        Err(EconomyError::InsufficientFunds {
            required,
            available,
        }) => format!(
            "❌ Not enough points (need {}, you have {})",
            required, available
        ),
        Err(EconomyError::BalanceOverflow { .. }) => {
            "❌ Your balance is already at the limit".to_string()
        }
        Err(e) => {
            tracing::error!(user_id = actor, error = %e, "Roll failed");
            "⚠️ Roll failed, no points were spent".to_string()
        }
    }
}

fn roll_reply(outcome: &RollOutcome) -> String {
    format!(
        "🎉 Your reward: {}\n💎 Your points: {}",
        outcome.reward.label, outcome.balance
    )
}

async fn add_points<S: BalanceStore>(
    data: &Data<S>,
    actor: &str,
    user_id: &str,
    amount: i64,
) -> String {
    if actor != data.owner_id {
        tracing::warn!(actor, user_id, amount, "Rejected addpoints from non-owner");
        return "❌ Owner only".to_string();
    }

    match data.economy.grant(user_id, amount).await {
        Ok(balance) => {
            notify_all(
                data,
                Notice::PointsGranted {
                    user_id: user_id.to_string(),
                    amount,
                    balance,
                },
            )
            .await;
            format!(
                "✨ Added {} points to {}\nCurrent points: {}",
                amount, user_id, balance
            )
        }
        Err(EconomyError::InvalidAmount(amount)) => {
            format!("❌ Invalid amount: {}", amount)
        }
        Err(EconomyError::InsufficientFunds { available, .. }) => {
            format!("❌ {} only has {} points", user_id, available)
        }
        Err(EconomyError::BalanceOverflow { balance, .. }) => {
            format!("❌ {} has {} points and can't hold any more", user_id, balance)
        }
        Err(e) => {
            tracing::error!(user_id, amount, error = %e, "Grant failed");
            "⚠️ Failed to save points, nothing changed".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::economy::{NotifyError, Reward, RewardTable};
    use crate::infra::economy::InMemoryBalanceStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
            self.notices.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    static ONLY_TWO_HUNDRED: [Reward; 1] = [Reward::points("add point +200", 1, 200)];

    fn setup() -> (Data<InMemoryBalanceStore>, Arc<RecordingNotifier>) {
        let recorder = Arc::new(RecordingNotifier::default());
        let economy = EconomyService::new(InMemoryBalanceStore::new())
            .with_rewards(RewardTable::new(&ONLY_TWO_HUNDRED).unwrap());
        let data = Data {
            economy: Arc::new(economy),
            notifiers: vec![recorder.clone() as Arc<dyn Notifier>],
            owner_id: "owner".to_string(),
        };
        (data, recorder)
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(
            parse_line("u1 ROLL"),
            Ok(Some(("u1".to_string(), Command::Roll)))
        );
        assert_eq!(
            parse_line("u1 points u2"),
            Ok(Some(("u1".to_string(), Command::Points(Some("u2".to_string())))))
        );
        assert_eq!(
            parse_line("owner addpoints u2 -50"),
            Ok(Some((
                "owner".to_string(),
                Command::AddPoints {
                    user_id: "u2".to_string(),
                    amount: -50
                }
            )))
        );
        assert_eq!(
            parse_line("u1"),
            Ok(Some(("u1".to_string(), Command::Help)))
        );
        assert!(parse_line("u1 addpoints u2 many").is_err());
        assert!(parse_line("u1 dance").is_err());
        assert!(parse_line("u1 roll now").is_err());
    }

    #[tokio::test]
    async fn test_addpoints_is_owner_only() {
        let (data, recorder) = setup();

        let reply = handle_line(&data, "u1 addpoints u1 1000").await.unwrap();
        assert_eq!(reply, "❌ Owner only");
        assert_eq!(data.economy.balance("u1").await, 0);
        assert!(recorder.notices.lock().unwrap().is_empty());

        let reply = handle_line(&data, "owner addpoints u1 50").await.unwrap();
        assert!(reply.contains("Current points: 50"));
        assert_eq!(data.economy.balance("u1").await, 50);
        assert_eq!(recorder.notices.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_roll_flow() {
        let (data, recorder) = setup();

        let reply = handle_line(&data, "u1 roll").await.unwrap();
        assert!(reply.starts_with("❌ Not enough points"));

        handle_line(&data, "owner addpoints u1 300").await;
        let reply = handle_line(&data, "u1 roll").await.unwrap();
        assert!(reply.contains("add point +200"));
        assert!(reply.contains("Your points: 200"));

        let reply = handle_line(&data, "u2 points u1").await.unwrap();
        assert_eq!(reply, "💎 u1 has 200 points");

        let notices = recorder.notices.lock().unwrap();
        // grant confirmation, then receipt and gacha log for the roll
        assert_eq!(notices.len(), 3);
        assert!(matches!(notices[1], Notice::RollReceipt { balance: 200, .. }));
        assert!(matches!(notices[2], Notice::GachaLog { .. }));
    }

    #[tokio::test]
    async fn test_invalid_grant_reply() {
        let (data, _) = setup();
        let reply = handle_line(&data, "owner addpoints u1 0").await.unwrap();
        assert_eq!(reply, "❌ Invalid amount: 0");

        let reply = handle_line(&data, "owner addpoints u1 -5").await.unwrap();
        assert_eq!(reply, "❌ u1 only has 0 points");
    }

    #[test]
    fn test_roll_reply_format() {
        let outcome = RollOutcome {
            reward: Reward::informational("discount 5%", 5),
            balance: 0,
        };
        assert_eq!(
            roll_reply(&outcome),
            "🎉 Your reward: discount 5%\n💎 Your points: 0"
        );
    }
}
