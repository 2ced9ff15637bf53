use std::sync::Arc;

use teloxide::{dispatching::UpdateHandler, prelude::*, utils::command::BotCommands};
use tokio::sync::mpsc;
use tracing::{info, warn};

use common::EngineCommand;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Dependencies injected into every handler via `dptree`.
#[derive(Clone)]
pub struct BotDeps {
    pub command_tx: mpsc::Sender<EngineCommand>,
    pub allowed_user_ids: Arc<Vec<i64>>,
}

/// Telegram bot commands exposed to the operator.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "CandleCall commands:")]
pub enum Command {
    #[command(description = "Post the session summary and stop scanning")]
    Off,
    #[command(description = "Post the session summary and keep scanning")]
    Status,
    #[command(description = "Show this help")]
    Help,
}

/// Start the Telegram bot in long-polling mode.
pub async fn start_bot(bot: Bot, deps: BotDeps) {
    let deps = Arc::new(deps);

    info!("Telegram bot starting (long-polling)");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![deps])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Off].endpoint(handle_off))
        .branch(case![Command::Status].endpoint(handle_status))
        .branch(case![Command::Help].endpoint(handle_help));

    // Plain "off" / "status" typed without a slash.
    let text_handler = dptree::filter_map(|msg: Message| msg.text().and_then(EngineCommand::parse))
        .endpoint(handle_text);

    Update::filter_message()
        .filter_map(|msg: Message| msg.from().map(|u| u.id))
        .filter_async(auth_filter)
        .branch(command_handler)
        .branch(text_handler)
}

/// Silently drop messages from users not in the allowed list.
async fn auth_filter(user_id: UserId, deps: Arc<BotDeps>) -> bool {
    let uid = user_id.0 as i64;
    let allowed = deps.allowed_user_ids.contains(&uid);
    if !allowed {
        warn!(user_id = uid, "Unauthorized Telegram access attempt");
    }
    allowed
}

async fn handle_off(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    forward(&bot, &msg, &deps, EngineCommand::Stop).await
}

async fn handle_status(bot: Bot, msg: Message, deps: Arc<BotDeps>) -> HandlerResult {
    forward(&bot, &msg, &deps, EngineCommand::Summary).await
}

async fn handle_text(bot: Bot, msg: Message, cmd: EngineCommand, deps: Arc<BotDeps>) -> HandlerResult {
    forward(&bot, &msg, &deps, cmd).await
}

async fn handle_help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
    Ok(())
}

async fn forward(bot: &Bot, msg: &Message, deps: &BotDeps, cmd: EngineCommand) -> HandlerResult {
    info!(command = ?cmd, chat_id = msg.chat.id.0, "Telegram command");
    let reply = if deps.command_tx.send(cmd).await.is_ok() {
        acknowledgement(cmd)
    } else {
        "Scanner is no longer running."
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Reply sent once a command is queued. Both take effect at the next cycle.
pub fn acknowledgement(cmd: EngineCommand) -> &'static str {
    match cmd {
        EngineCommand::Stop => "Stopping after the current cycle. Summary follows.",
        EngineCommand::Summary => "Summary will be posted at the next cycle.",
    }
}
