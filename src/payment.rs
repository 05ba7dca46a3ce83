//! Payment gate and the Razorpay payment-links client behind it.

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::error::{BotError, BotResult};

/// Email the bot attaches to every payment link it creates for `chat_id`;
/// used to find the chat's links again when checking status.
pub fn customer_email(chat_id: i64) -> String {
    format!("user-{}@example.com", chat_id)
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A payment link as listed by the provider.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PaymentLinkRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub short_url: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    // Razorpay sends `[]` instead of `{}` when a link has no notes
    #[serde(default)]
    pub notes: serde_json::Value,
}

impl PaymentLinkRecord {
    pub fn belongs_to(&self, chat_id: i64) -> bool {
        let email = customer_email(chat_id);
        let by_email = self
            .customer
            .as_ref()
            .and_then(|c| c.email.as_deref())
            .is_some_and(|e| e == email);
        let by_note = self
            .notes
            .get("telegram_chat_id")
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == chat_id.to_string());
        by_email || by_note
    }

    pub fn is_paid(&self) -> bool {
        self.status.eq_ignore_ascii_case("paid")
    }
}

/// The two operations the bot needs from a payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted payment page for `amount` (major currency units) and
    /// return its URL.
    async fn create_link(&self, chat_id: i64, amount: u32) -> BotResult<String>;

    async fn list_links(&self) -> BotResult<Vec<PaymentLinkRecord>>;
}

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub api_base: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
    pub description: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct CreateLinkRequest<'a> {
    amount: u64,
    currency: &'a str,
    accept_partial: bool,
    description: &'a str,
    customer: CreateLinkCustomer,
    notify: Notify,
    reminder_enable: bool,
    notes: LinkNotes,
}

#[derive(Serialize)]
struct CreateLinkCustomer {
    name: String,
    email: String,
}

#[derive(Serialize)]
struct Notify {
    sms: bool,
    email: bool,
}

#[derive(Serialize)]
struct LinkNotes {
    telegram_chat_id: String,
}

#[derive(Deserialize)]
struct CreateLinkResponse {
    short_url: String,
}

#[derive(Deserialize)]
struct ListLinksResponse {
    #[serde(default)]
    payment_links: Vec<PaymentLinkRecord>,
}

/// Razorpay payment-links API over HTTPS with basic auth.
#[derive(Clone)]
pub struct RazorpayClient {
    client: Client,
    config: RazorpayConfig,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> BotResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

async fn error_for_status(response: reqwest::Response) -> BotResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(BotError::PaymentProvider(format!("{}: {}", status, body)))
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    async fn create_link(&self, chat_id: i64, amount: u32) -> BotResult<String> {
        let request = CreateLinkRequest {
            // Razorpay expects the smallest currency unit (paise)
            amount: amount as u64 * 100,
            currency: &self.config.currency,
            accept_partial: false,
            description: &self.config.description,
            customer: CreateLinkCustomer {
                name: format!("TelegramUser_{}", chat_id),
                email: customer_email(chat_id),
            },
            notify: Notify {
                sms: false,
                email: false,
            },
            reminder_enable: true,
            notes: LinkNotes {
                telegram_chat_id: chat_id.to_string(),
            },
        };
        let response = self
            .client
            .post(self.url("payment_links"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&request)
            .send()
            .await?;
        let created: CreateLinkResponse = error_for_status(response).await?.json().await?;
        tracing::info!("payment link created for chat {}", chat_id);
        Ok(created.short_url)
    }

    async fn list_links(&self) -> BotResult<Vec<PaymentLinkRecord>> {
        let response = self
            .client
            .get(self.url("payment_links"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await?;
        let listed: ListLinksResponse = error_for_status(response).await?.json().await?;
        Ok(listed.payment_links)
    }
}

/// Access check consulted before serving content.
///
/// A "paid" verdict is cached for `paid_ttl`; "unpaid" is never cached so a
/// fresh payment unlocks the bot on the next message. Links handed out are
/// reused for `link_ttl` instead of minting a new one per request.
pub struct PaymentGate {
    provider: Arc<dyn PaymentProvider>,
    paid: DashMap<i64, Instant>,
    links: DashMap<i64, (String, Instant)>,
    paid_ttl: Duration,
    link_ttl: Duration,
    timeout: Duration,
}

impl PaymentGate {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        paid_ttl: Duration,
        link_ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            paid: DashMap::new(),
            links: DashMap::new(),
            paid_ttl,
            link_ttl,
            timeout,
        }
    }

    /// Whether `chat_id` has a paid link. Provider failures read as unpaid.
    pub async fn is_paid(&self, chat_id: i64) -> bool {
        let cached = self.paid.get(&chat_id).map(|at| *at);
        if cached.is_some_and(|at| at.elapsed() < self.paid_ttl) {
            return true;
        }
        match tokio::time::timeout(self.timeout, self.provider.list_links()).await {
            Ok(Ok(links)) => {
                let paid = links.iter().any(|l| l.belongs_to(chat_id) && l.is_paid());
                if paid {
                    self.paid.insert(chat_id, Instant::now());
                    self.links.remove(&chat_id);
                } else {
                    self.paid.remove(&chat_id);
                }
                paid
            }
            Ok(Err(e)) => {
                tracing::warn!("payment status check failed for chat {}: {}", chat_id, e);
                false
            }
            Err(_) => {
                tracing::warn!("payment status check timed out for chat {}", chat_id);
                false
            }
        }
    }

    /// Payment page URL for `chat_id`, or `None` if the provider failed.
    pub async fn create_payment_link(&self, chat_id: i64, amount: u32) -> Option<String> {
        let reusable = self
            .links
            .get(&chat_id)
            .filter(|e| e.1.elapsed() < self.link_ttl)
            .map(|e| e.0.clone());
        if reusable.is_some() {
            return reusable;
        }
        match tokio::time::timeout(self.timeout, self.provider.create_link(chat_id, amount)).await
        {
            Ok(Ok(link)) => {
                self.links.insert(chat_id, (link.clone(), Instant::now()));
                Some(link)
            }
            Ok(Err(e)) => {
                tracing::warn!("payment link creation failed for chat {}: {}", chat_id, e);
                None
            }
            Err(_) => {
                tracing::warn!("payment link creation timed out for chat {}", chat_id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        paid_chat: Option<i64>,
        lists: AtomicUsize,
        creates: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(paid_chat: Option<i64>, fail: bool) -> Self {
            Self {
                paid_chat,
                lists: AtomicUsize::new(0),
                creates: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for CountingProvider {
        async fn create_link(&self, chat_id: i64, _amount: u32) -> BotResult<String> {
            let n = self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BotError::PaymentProvider("down".to_string()));
            }
            Ok(format!("https://rzp.io/l/{}-{}", chat_id, n))
        }

        async fn list_links(&self) -> BotResult<Vec<PaymentLinkRecord>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BotError::PaymentProvider("down".to_string()));
            }
            Ok(self
                .paid_chat
                .map(|chat| PaymentLinkRecord {
                    id: "plink_1".to_string(),
                    status: "PAID".to_string(),
                    customer: Some(Customer {
                        name: None,
                        email: Some(customer_email(chat)),
                    }),
                    ..Default::default()
                })
                .into_iter()
                .collect())
        }
    }

    fn gate(provider: Arc<CountingProvider>) -> PaymentGate {
        PaymentGate::new(
            provider,
            Duration::from_secs(300),
            Duration::from_secs(900),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn record_matches_by_email_or_note() {
        let by_email = PaymentLinkRecord {
            customer: Some(Customer {
                name: None,
                email: Some("user-42@example.com".to_string()),
            }),
            ..Default::default()
        };
        assert!(by_email.belongs_to(42));
        assert!(!by_email.belongs_to(4));

        let by_note: PaymentLinkRecord = serde_json::from_str(
            r#"{"id":"plink_2","status":"paid","notes":{"telegram_chat_id":"77"}}"#,
        )
        .unwrap();
        assert!(by_note.belongs_to(77));
        assert!(by_note.is_paid());

        let empty_notes: PaymentLinkRecord =
            serde_json::from_str(r#"{"id":"plink_3","status":"created","notes":[]}"#).unwrap();
        assert!(!empty_notes.belongs_to(77));
        assert!(!empty_notes.is_paid());
    }

    #[tokio::test]
    async fn paid_verdict_is_cached_unpaid_is_not() {
        let provider = Arc::new(CountingProvider::new(Some(1), false));
        let gate = gate(provider.clone());
        assert!(gate.is_paid(1).await);
        assert!(gate.is_paid(1).await);
        assert_eq!(provider.lists.load(Ordering::SeqCst), 1);

        assert!(!gate.is_paid(2).await);
        assert!(!gate.is_paid(2).await);
        assert_eq!(provider.lists.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn provider_failure_reads_as_unpaid_and_no_link() {
        let provider = Arc::new(CountingProvider::new(Some(1), true));
        let gate = gate(provider);
        assert!(!gate.is_paid(1).await);
        assert_eq!(gate.create_payment_link(1, 29).await, None);
    }

    #[tokio::test]
    async fn recent_link_is_reused() {
        let provider = Arc::new(CountingProvider::new(None, false));
        let gate = gate(provider.clone());
        let first = gate.create_payment_link(3, 29).await.unwrap();
        let second = gate.create_payment_link(3, 29).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
        let other = gate.create_payment_link(4, 29).await.unwrap();
        assert_ne!(first, other);
    }
}
