// Economy infrastructure - balance stores and notifiers

mod in_memory;
mod json_balance_store;
mod notifiers;

pub use in_memory::InMemoryBalanceStore;
pub use json_balance_store::JsonBalanceStore;
pub use notifiers::{GachaLogFile, TracingNotifier};
