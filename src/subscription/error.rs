use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionErrorCode {
    InvalidKey,
    StreamFailed,
    FetchFailed,
    Cancelled,
}

impl SubscriptionErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionErrorCode::InvalidKey => "subscription/invalid-key",
            SubscriptionErrorCode::StreamFailed => "subscription/stream-failed",
            SubscriptionErrorCode::FetchFailed => "subscription/fetch-failed",
            SubscriptionErrorCode::Cancelled => "subscription/cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionError {
    pub code: SubscriptionErrorCode,
    message: String,
}

impl SubscriptionError {
    pub fn new(code: SubscriptionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SubscriptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for SubscriptionError {}

pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

pub fn invalid_key(message: impl Into<String>) -> SubscriptionError {
    SubscriptionError::new(SubscriptionErrorCode::InvalidKey, message)
}

pub fn stream_failed(message: impl Into<String>) -> SubscriptionError {
    SubscriptionError::new(SubscriptionErrorCode::StreamFailed, message)
}

pub fn fetch_failed(message: impl Into<String>) -> SubscriptionError {
    SubscriptionError::new(SubscriptionErrorCode::FetchFailed, message)
}

pub fn cancelled(message: impl Into<String>) -> SubscriptionError {
    SubscriptionError::new(SubscriptionErrorCode::Cancelled, message)
}
