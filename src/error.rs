use thiserror::Error;

/// Errors raised while handling an update, talking to the payment provider
/// or loading the program fixtures.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The payment provider answered with a non-success status or an
    /// unexpected body.
    #[error("payment provider error: {0}")]
    PaymentProvider(String),

    #[error("{0} timed out")]
    Timeout(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid program content: {0}")]
    InvalidContent(String),
}

pub type BotResult<T> = Result<T, BotError>;

/// A callback token that carries a known prefix but an unparseable tail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    #[error("malformed day token: {0}")]
    Flow(String),

    #[error("malformed challenge token: {0}")]
    Challenge(String),

    #[error("malformed reminder token: {0}")]
    Reminder(String),

    #[error("malformed check-in token: {0}")]
    CheckIn(String),
}
