use anyhow::{Context, Result};
use chrono::NaiveTime;
use std::{env, fmt, path::PathBuf, time::Duration};

use crate::payment::RazorpayConfig;

/// Runtime configuration (from environment with sensible defaults)
#[derive(Clone)]
pub struct Config {
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_api_base: String,
    /// price of access in whole currency units (rupees)
    pub payment_amount: u32,
    pub payment_currency: String,
    pub payment_description: String,
    pub content_path: String,
    pub messages_path: String,
    pub data_dir: PathBuf,
    /// local time of day at which daily reminders become due
    pub reminder_time: NaiveTime,
    pub sweep_interval: Duration,
    pub paid_cache_ttl: Duration,
    pub payment_link_ttl: Duration,
    /// upper bound on any single call to Telegram or the payment provider
    pub external_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("razorpay_key_id", &self.razorpay_key_id)
            .field("razorpay_key_secret", &"<redacted>")
            .field("razorpay_api_base", &self.razorpay_api_base)
            .field("payment_amount", &self.payment_amount)
            .field("payment_currency", &self.payment_currency)
            .field("payment_description", &self.payment_description)
            .field("content_path", &self.content_path)
            .field("messages_path", &self.messages_path)
            .field("data_dir", &self.data_dir)
            .field("reminder_time", &self.reminder_time)
            .field("sweep_interval", &self.sweep_interval)
            .field("paid_cache_ttl", &self.paid_cache_ttl)
            .field("payment_link_ttl", &self.payment_link_ttl)
            .field("external_timeout", &self.external_timeout)
            .finish()
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn secs_or(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

/// Parse an `HH:MM` time of day.
pub fn parse_reminder_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

impl Config {
    /// Read configuration from the environment and validate it.
    pub fn from_env() -> Result<Config> {
        let reminder_raw = var_or("REMINDER_TIME", "09:00");
        let reminder_time = parse_reminder_time(&reminder_raw).with_context(|| {
            format!(
                "Invalid configuration: REMINDER_TIME ({}) must be HH:MM.",
                reminder_raw
            )
        })?;
        let cfg = Config {
            razorpay_key_id: var_or("RAZORPAY_KEY_ID", ""),
            razorpay_key_secret: var_or("RAZORPAY_KEY_SECRET", ""),
            razorpay_api_base: var_or("RAZORPAY_API_BASE", "https://api.razorpay.com/v1"),
            payment_amount: env::var("PAYMENT_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(29),
            payment_currency: var_or("PAYMENT_CURRENCY", "INR"),
            payment_description: var_or("PAYMENT_DESCRIPTION", "Mental Wellness Bot Subscription"),
            content_path: var_or("CONTENT_PATH", "content/program.json"),
            messages_path: var_or("MESSAGES_PATH", "messages/en.json"),
            data_dir: PathBuf::from(var_or("DATA_DIR", "data")),
            reminder_time,
            sweep_interval: secs_or("SWEEP_INTERVAL_SECS", 60),
            paid_cache_ttl: secs_or("PAID_CACHE_TTL_SECS", 300),
            payment_link_ttl: secs_or("PAYMENT_LINK_TTL_SECS", 900),
            external_timeout: secs_or("EXTERNAL_TIMEOUT_SECS", 10),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.razorpay_key_id.is_empty() || self.razorpay_key_secret.is_empty() {
            anyhow::bail!(
                "Invalid configuration: RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET must be set."
            );
        }
        if self.payment_amount == 0 {
            anyhow::bail!("Invalid configuration: PAYMENT_AMOUNT must be a positive integer.");
        }
        if self.sweep_interval.is_zero() {
            anyhow::bail!("Invalid configuration: SWEEP_INTERVAL_SECS must be positive.");
        }
        if self.external_timeout.is_zero() {
            anyhow::bail!("Invalid configuration: EXTERNAL_TIMEOUT_SECS must be positive.");
        }
        Ok(())
    }

    /// Where reminder subscriptions are persisted.
    pub fn subscriptions_path(&self) -> PathBuf {
        self.data_dir.join("subscriptions.json")
    }

    pub fn razorpay(&self) -> RazorpayConfig {
        RazorpayConfig {
            api_base: self.razorpay_api_base.clone(),
            key_id: self.razorpay_key_id.clone(),
            key_secret: self.razorpay_key_secret.clone(),
            currency: self.payment_currency.clone(),
            description: self.payment_description.clone(),
            timeout: self.external_timeout,
        }
    }
}
