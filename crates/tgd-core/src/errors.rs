use std::{fmt, time::Duration};

/// Core error type for the dispatch core.
///
/// Adapter crates map their transport failures into [`TransportError`]; the
/// dispatcher wraps those into this type so callers can tell configuration
/// mistakes from delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("Recipient is required for Telegram sends")]
    EmptyRecipient,

    #[error(
        "Telegram bot token missing for account \"{account_id}\" (set accounts.{account_id}.botToken/tokenFile or TELEGRAM_BOT_TOKEN for default)."
    )]
    MissingCredential { account_id: String },

    #[error("Message must be non-empty for Telegram sends")]
    EmptyMessageBody,

    #[error("Message id is required for Telegram reactions (got {0:?})")]
    InvalidMessageId(String),

    #[error("{0}")]
    UnsupportedCapability(&'static str),

    #[error(
        "Telegram send failed: chat not found (chat_id={chat_id}). Likely: bot not started in DM, bot removed from group/channel, group migrated (new -100… id), or wrong bot token. Input was: {input:?}."
    )]
    ChatNotFound { chat_id: String, input: String },

    #[error("telegram {label} failed: {source}")]
    Transport {
        label: String,
        #[source]
        source: TransportError,
    },

    #[error("media fetch failed: {0}")]
    MediaFetch(String),

    #[error("media exceeds {limit} bytes")]
    MediaTooLarge { limit: u64 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// True for errors raised before any network call (bad input or config).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyRecipient
                | Error::MissingCredential { .. }
                | Error::EmptyMessageBody
                | Error::InvalidMessageId(_)
                | Error::Config(_)
        )
    }

    pub fn transport(label: impl Into<String>, source: TransportError) -> Self {
        Error::Transport {
            label: label.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse category of a Bot API failure, as far as the adapter can tell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Telegram rejected the HTML/Markdown entities in the text.
    ParseEntities,
    /// `400: Bad Request: chat not found`.
    ChatNotFound,
    /// `429: Too Many Requests`.
    RateLimited,
    /// Connection-level failure (DNS, TLS, reset, timeout).
    Network,
    /// Any other error reported by the Bot API.
    Api,
    Other,
}

/// A single failed transport call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// Server-requested delay before the next call (`parameters.retry_after`).
    pub retry_after: Option<Duration>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_flagged() {
        assert!(Error::EmptyRecipient.is_validation());
        assert!(Error::MissingCredential {
            account_id: "default".to_string()
        }
        .is_validation());
        assert!(!Error::UnsupportedCapability("x").is_validation());
        assert!(!Error::transport(
            "message",
            TransportError::new(TransportErrorKind::Network, "reset")
        )
        .is_validation());
    }

    #[test]
    fn chat_not_found_message_names_chat_and_input() {
        let e = Error::ChatNotFound {
            chat_id: "-100123".to_string(),
            input: "telegram:group:-100123".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains("chat_id=-100123"));
        assert!(msg.contains("bot not started in DM"));
        assert!(msg.contains("wrong bot token"));
        assert!(msg.contains("\"telegram:group:-100123\""));
    }
}
