use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
};

use crate::error::{BotError, BotResult};
use crate::outbound::{Button, ButtonAction, MessageSink, OutboundMessage};

/// Delivers outbound messages through the Bot API as HTML.
#[derive(Clone)]
pub struct TelegramSink {
    bot: Bot,
    timeout: Duration,
}

impl TelegramSink {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }
}

fn to_button(button: &Button) -> Option<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::Callback(token) => Some(InlineKeyboardButton::callback(
            button.label.clone(),
            token.clone(),
        )),
        ButtonAction::Url(raw) => match Url::parse(raw) {
            Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
            Err(e) => {
                tracing::warn!("dropping button {:?}: bad url {}: {}", button.label, raw, e);
                None
            }
        },
    }
}

/// Rows of Telegram buttons; rows left empty after dropping bad links are skipped.
pub fn to_markup(keyboard: &[Vec<Button>]) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .iter()
        .map(|row| row.iter().filter_map(to_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, chat_id: i64, message: OutboundMessage) -> BotResult<()> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), message.text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = to_markup(&message.keyboard) {
            request = request.reply_markup(markup);
        }
        match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(result) => {
                result?;
                Ok(())
            }
            Err(_) => Err(BotError::Timeout("telegram send")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_links_are_dropped() {
        let keyboard = vec![
            vec![Button::url("broken", "not a url")],
            vec![
                Button::url("ok", "https://example.com/a"),
                Button::callback("menu", "MENU:OPEN"),
            ],
        ];
        let markup = to_markup(&keyboard).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
    }

    #[test]
    fn empty_keyboard_has_no_markup() {
        assert!(to_markup(&[]).is_none());
    }
}
