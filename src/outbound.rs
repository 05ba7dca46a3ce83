use async_trait::async_trait;

use crate::error::BotResult;

/// What pressing a button does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Url(String),
    Callback(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn url(label: &str, url: &str) -> Button {
        Button {
            label: label.to_string(),
            action: ButtonAction::Url(url.to_string()),
        }
    }

    pub fn callback(label: &str, token: impl ToString) -> Button {
        Button {
            label: label.to_string(),
            action: ButtonAction::Callback(token.to_string()),
        }
    }
}

/// A message ready to be delivered: HTML text plus rows of inline buttons.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Vec<Vec<Button>>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> OutboundMessage {
        OutboundMessage {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    pub fn with_keyboard(mut self, keyboard: Vec<Vec<Button>>) -> OutboundMessage {
        self.keyboard = keyboard;
        self
    }

    /// Callback tokens of every button, in row order.
    pub fn callback_tokens(&self) -> Vec<&str> {
        self.buttons()
            .filter_map(|b| match &b.action {
                ButtonAction::Callback(t) => Some(t.as_str()),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }

    /// Link targets of every button, in row order.
    pub fn urls(&self) -> Vec<&str> {
        self.buttons()
            .filter_map(|b| match &b.action {
                ButtonAction::Url(u) => Some(u.as_str()),
                ButtonAction::Callback(_) => None,
            })
            .collect()
    }

    fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.keyboard.iter().flatten()
    }
}

/// Delivery channel for outbound messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, chat_id: i64, message: OutboundMessage) -> BotResult<()>;
}
