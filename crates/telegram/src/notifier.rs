use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use tracing::debug;

use common::{Error, Notifier, Result};

/// Delivers rendered reports to one chat as bold HTML.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: i64) -> Self {
        Self {
            bot,
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn emit(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat_id, bold_html(text))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| Error::Notify(e.to_string()))?;
        debug!(chat_id = self.chat_id.0, "Report delivered");
        Ok(())
    }
}

/// Escape for Telegram HTML and wrap the whole message in `<b>`.
pub fn bold_html(text: &str) -> String {
    html::bold(&html::escape(text))
}
