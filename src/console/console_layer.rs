// Console layer - turns stdin lines into economy commands.

#[path = "commands.rs"]
pub mod commands;

pub use commands::{handle_line, Data};
