use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use teloxide::prelude::*;

pub mod callback;
pub mod config;
pub mod content;
pub mod error;
pub mod flow;
pub mod messages;
pub mod outbound;
pub mod payment;
pub mod progress;
pub mod reminders;
pub mod router;
pub mod store;
pub mod telegram;

pub use callback::CallbackAction;
pub use config::Config;
pub use content::{ChallengeId, ContentStep, ContentTable, PROGRAM_DAYS};
pub use error::{BotError, BotResult, CallbackError};
pub use messages::{Messages, default_messages, format_with, load_messages_file};
pub use outbound::{Button, ButtonAction, MessageSink, OutboundMessage};
pub use payment::{PaymentGate, PaymentLinkRecord, PaymentProvider, RazorpayClient};
pub use progress::ProgressTracker;
pub use reminders::{Reminders, SweepReport};
pub use router::{Inbound, Router};
pub use store::{MemoryStore, ReminderSubscription, SubscriptionStore};
pub use telegram::TelegramSink;

type HandlerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

async fn on_message(msg: Message, router: Arc<Router>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let first_name = msg.from.as_ref().map(|u| u.first_name.clone());
    router
        .dispatch(Inbound::Text {
            chat_id: msg.chat.id.0,
            text: text.to_string(),
            first_name,
        })
        .await;
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, router: Arc<Router>) -> HandlerResult {
    // stop the client-side spinner whatever happens next
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        tracing::warn!("answer_callback_query failed: {}", e);
    }
    let chat_id = q.message.as_ref().map(|m| m.chat().id.0);
    match (chat_id, q.data) {
        (Some(chat_id), Some(data)) => router.dispatch(Inbound::Callback { chat_id, data }).await,
        _ => tracing::debug!("callback {:?} without chat or data ignored", q.id),
    }
    Ok(())
}

/// Wire everything from the environment and run until Ctrl-C.
pub async fn run_bot() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv().ok();

    let token = env::var("TELOXIDE_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .context("Invalid configuration: TELOXIDE_TOKEN must be set.")?;
    let cfg = Config::from_env()?;
    tracing::info!("starting with {:?}", cfg);

    let content = content::load_content_file(&cfg.content_path)
        .with_context(|| format!("loading program content from {}", cfg.content_path))?;
    let messages = Arc::new(load_messages_file(&cfg.messages_path));

    let bot = Bot::new(token);
    let sink: Arc<dyn MessageSink> = Arc::new(TelegramSink::new(bot.clone(), cfg.external_timeout));
    let store: Arc<dyn SubscriptionStore> =
        Arc::new(MemoryStore::with_snapshot(cfg.subscriptions_path()));
    let progress = Arc::new(ProgressTracker::new());

    let provider = Arc::new(RazorpayClient::new(cfg.razorpay())?);
    let gate = Arc::new(PaymentGate::new(
        provider,
        cfg.paid_cache_ttl,
        cfg.payment_link_ttl,
        cfg.external_timeout,
    ));

    let reminders = Arc::new(Reminders::new(
        store,
        sink.clone(),
        progress.clone(),
        messages.clone(),
        cfg.reminder_time,
    ));
    let sweeper = reminders.clone().spawn(cfg.sweep_interval);

    let router = Arc::new(Router::new(
        Arc::new(content),
        messages,
        gate,
        reminders,
        progress,
        sink,
        cfg.payment_amount,
    ));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    sweeper.abort();
    tracing::info!("shut down");
    Ok(())
}
