pub mod commands;
pub mod notifier;

pub use commands::{start_bot, BotDeps};
pub use notifier::TelegramNotifier;
