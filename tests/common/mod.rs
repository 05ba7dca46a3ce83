#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveTime;
use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use mental_wellness_bot::{
    BotError, BotResult, ContentTable, MemoryStore, MessageSink, OutboundMessage, PaymentGate,
    PaymentLinkRecord, PaymentProvider, ProgressTracker, Reminders, Router, SubscriptionStore,
    content::load_content_file, load_messages_file, payment::Customer, payment::customer_email,
};

/// Sink that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(i64, OutboundMessage)>>,
    /// chats whose deliveries fail
    pub failing: Mutex<HashSet<i64>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<(i64, OutboundMessage)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn fail_for(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&self, chat_id: i64, message: OutboundMessage) -> BotResult<()> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(BotError::Timeout("telegram send"));
        }
        self.sent.lock().unwrap().push((chat_id, message));
        Ok(())
    }
}

/// Provider with a fixed set of paid chats.
#[derive(Default)]
pub struct FakeProvider {
    pub paid: Mutex<HashSet<i64>>,
    pub down: Mutex<bool>,
    pub created: AtomicUsize,
}

impl FakeProvider {
    pub fn pay(&self, chat_id: i64) {
        self.paid.lock().unwrap().insert(chat_id);
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_link(&self, chat_id: i64, _amount: u32) -> BotResult<String> {
        if *self.down.lock().unwrap() {
            return Err(BotError::PaymentProvider("503 Service Unavailable".to_string()));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://rzp.io/l/test{}_{}", chat_id, n))
    }

    async fn list_links(&self) -> BotResult<Vec<PaymentLinkRecord>> {
        if *self.down.lock().unwrap() {
            return Err(BotError::PaymentProvider("503 Service Unavailable".to_string()));
        }
        Ok(self
            .paid
            .lock()
            .unwrap()
            .iter()
            .map(|chat| PaymentLinkRecord {
                id: format!("plink_{}", chat),
                status: "paid".to_string(),
                customer: Some(Customer {
                    name: None,
                    email: Some(customer_email(*chat)),
                }),
                ..Default::default()
            })
            .collect())
    }
}

pub fn nine() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

/// Everything a router test needs to drive and observe the bot.
pub struct Harness {
    pub router: Router,
    pub sink: Arc<RecordingSink>,
    pub provider: Arc<FakeProvider>,
    pub store: Arc<MemoryStore>,
    pub reminders: Arc<Reminders>,
    pub progress: Arc<ProgressTracker>,
    pub content: Arc<ContentTable>,
}

pub fn harness() -> Harness {
    let content = Arc::new(load_content_file("content/program.json").unwrap());
    let messages = Arc::new(load_messages_file("messages/en.json"));
    let sink = Arc::new(RecordingSink::default());
    let provider = Arc::new(FakeProvider::default());
    let store = Arc::new(MemoryStore::new());
    let progress = Arc::new(ProgressTracker::new());
    let gate = Arc::new(PaymentGate::new(
        provider.clone(),
        Duration::from_secs(300),
        Duration::from_secs(900),
        Duration::from_secs(5),
    ));
    let reminders = Arc::new(Reminders::new(
        store.clone() as Arc<dyn SubscriptionStore>,
        sink.clone(),
        progress.clone(),
        messages.clone(),
        nine(),
    ));
    let router = Router::new(
        content.clone(),
        messages,
        gate,
        reminders.clone(),
        progress.clone(),
        sink.clone(),
        29,
    );
    Harness {
        router,
        sink,
        provider,
        store,
        reminders,
        progress,
        content,
    }
}
