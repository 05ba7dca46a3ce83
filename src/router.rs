//! Dispatch of inbound updates to program actions.

use chrono::Local;
use std::sync::Arc;

use crate::callback::CallbackAction;
use crate::content::ContentTable;
use crate::error::{BotResult, CallbackError};
use crate::flow;
use crate::messages::{Messages, format_with};
use crate::outbound::{MessageSink, OutboundMessage};
use crate::payment::PaymentGate;
use crate::progress::ProgressTracker;
use crate::reminders::Reminders;

/// An update reduced to what the router needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound {
    Text {
        chat_id: i64,
        text: String,
        first_name: Option<String>,
    },
    Callback {
        chat_id: i64,
        data: String,
    },
}

impl Inbound {
    pub fn chat_id(&self) -> i64 {
        match self {
            Inbound::Text { chat_id, .. } | Inbound::Callback { chat_id, .. } => *chat_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextCommand {
    Start,
    Pay,
    Menu,
    Stop,
    Other,
}

/// Classify free text; matching is exact after trimming, ignoring case.
pub fn parse_text_command(text: &str) -> TextCommand {
    let text = text.trim();
    if ["/start", "hi", "hello"]
        .iter()
        .any(|c| text.eq_ignore_ascii_case(c))
    {
        TextCommand::Start
    } else if text.eq_ignore_ascii_case("/pay") {
        TextCommand::Pay
    } else if text.eq_ignore_ascii_case("/menu") {
        TextCommand::Menu
    } else if text.eq_ignore_ascii_case("/stop") {
        TextCommand::Stop
    } else {
        TextCommand::Other
    }
}

pub struct Router {
    content: Arc<ContentTable>,
    messages: Arc<Messages>,
    gate: Arc<PaymentGate>,
    reminders: Arc<Reminders>,
    progress: Arc<ProgressTracker>,
    sink: Arc<dyn MessageSink>,
    payment_amount: u32,
}

impl Router {
    pub fn new(
        content: Arc<ContentTable>,
        messages: Arc<Messages>,
        gate: Arc<PaymentGate>,
        reminders: Arc<Reminders>,
        progress: Arc<ProgressTracker>,
        sink: Arc<dyn MessageSink>,
        payment_amount: u32,
    ) -> Self {
        Self {
            content,
            messages,
            gate,
            reminders,
            progress,
            sink,
            payment_amount,
        }
    }

    /// Handle one update. Never fails: any error is logged and answered with
    /// the generic "something went wrong" message.
    pub async fn dispatch(&self, event: Inbound) {
        let chat_id = event.chat_id();
        if let Err(err) = self.handle(event).await {
            tracing::error!("handler error for chat {}: {:?}", chat_id, err);
            let reply = OutboundMessage::text(self.messages.generic_error.clone());
            if let Err(e) = self.sink.send(chat_id, reply).await {
                tracing::error!("could not report failure to chat {}: {}", chat_id, e);
            }
        }
    }

    pub async fn handle(&self, event: Inbound) -> BotResult<()> {
        match event {
            Inbound::Text {
                chat_id,
                text,
                first_name,
            } => self.handle_text(chat_id, &text, first_name.as_deref()).await,
            Inbound::Callback { chat_id, data } => self.handle_callback(chat_id, &data).await,
        }
    }

    async fn handle_text(
        &self,
        chat_id: i64,
        text: &str,
        first_name: Option<&str>,
    ) -> BotResult<()> {
        match parse_text_command(text) {
            TextCommand::Start => {
                if !self.gate.is_paid(chat_id).await {
                    return self
                        .send_payment_link(chat_id, &self.messages.pay_prompt_start)
                        .await;
                }
                self.send(chat_id, flow::welcome_message(&self.messages, first_name))
                    .await
            }
            TextCommand::Pay => {
                self.send_payment_link(chat_id, &self.messages.pay_prompt)
                    .await
            }
            TextCommand::Menu => {
                if !self.gate.is_paid(chat_id).await {
                    return self.send_locked(chat_id).await;
                }
                self.send(chat_id, flow::menu_message(&self.messages)).await
            }
            TextCommand::Stop => {
                if !self.gate.is_paid(chat_id).await {
                    return self.send_locked(chat_id).await;
                }
                self.reminders.unsubscribe(chat_id);
                self.send_text(chat_id, &self.messages.stop_confirmed).await
            }
            TextCommand::Other => self.send_text(chat_id, &self.messages.unknown_text).await,
        }
    }

    async fn handle_callback(&self, chat_id: i64, data: &str) -> BotResult<()> {
        if !self.gate.is_paid(chat_id).await {
            return self.send_locked(chat_id).await;
        }
        let action = match CallbackAction::parse(data) {
            Ok(action) => action,
            Err(err) => {
                tracing::warn!("chat {}: {}", chat_id, err);
                let hint = match err {
                    CallbackError::Flow(_) => &self.messages.flow_failed,
                    CallbackError::Challenge(_) => &self.messages.challenge_failed,
                    CallbackError::Reminder(_) => &self.messages.remind_failed,
                    CallbackError::CheckIn(_) => &self.messages.unknown_callback,
                };
                return self.send_text(chat_id, hint).await;
            }
        };
        let today = Local::now().date_naive();

        match action {
            CallbackAction::OpenMenu => {
                self.send(chat_id, flow::menu_message(&self.messages)).await
            }
            CallbackAction::StartChallenge(challenge) => {
                self.progress.mark_active(chat_id, today);
                let intro = flow::challenge_intro_message(
                    &self.messages,
                    challenge,
                    self.content.intro_text(challenge),
                );
                self.send(chat_id, intro).await?;
                let step = self.content.lookup(challenge, 1);
                self.send(chat_id, flow::step_message(&self.messages, challenge, step))
                    .await
            }
            CallbackAction::ShowDay { challenge, day } => {
                self.progress.mark_active(chat_id, today);
                let step = self.content.lookup(challenge, day);
                self.send(chat_id, flow::step_message(&self.messages, challenge, step))
                    .await
            }
            CallbackAction::StartReminders { challenge, days } => {
                self.reminders.subscribe(chat_id, challenge, days, today);
                let reply = format_with(
                    &self.messages.remind_confirmed,
                    &[("days", &days.to_string())],
                );
                self.send(chat_id, OutboundMessage::text(reply)).await
            }
            CallbackAction::CheckIn(challenge) => {
                tracing::info!("chat {} requested a check-in after {}", chat_id, challenge);
                self.send_text(chat_id, &self.messages.checkin_ack).await
            }
            CallbackAction::Unknown => {
                self.send_text(chat_id, &self.messages.unknown_callback)
                    .await
            }
        }
    }

    async fn send_payment_link(&self, chat_id: i64, template: &str) -> BotResult<()> {
        match self
            .gate
            .create_payment_link(chat_id, self.payment_amount)
            .await
        {
            Some(link) => {
                self.send(chat_id, flow::payment_message(template, &link))
                    .await
            }
            None => self.send_text(chat_id, &self.messages.pay_failed).await,
        }
    }

    async fn send_locked(&self, chat_id: i64) -> BotResult<()> {
        self.send_text(chat_id, &self.messages.access_locked).await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> BotResult<()> {
        self.send(chat_id, OutboundMessage::text(text)).await
    }

    async fn send(&self, chat_id: i64, message: OutboundMessage) -> BotResult<()> {
        self.sink.send(chat_id, message).await
    }
}
