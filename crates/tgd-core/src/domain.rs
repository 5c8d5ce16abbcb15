use std::fmt;

use serde::Serialize;

/// Canonical Bot API chat identifier: `@username` or a signed numeric id.
///
/// Built by [`crate::recipient::normalize_chat_id`]; opaque ids that match
/// neither shape are carried through unchanged for the Bot API to reject.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatTarget(String);

impl ChatTarget {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric chat id, if this target is one.
    pub fn numeric(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Forum topic / reply linkage for an outbound message.
///
/// Only fields that are set end up on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadParams {
    pub message_thread_id: Option<i32>,
    pub reply_to_message_id: Option<i32>,
}

/// What the transport reports back for a delivered message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i32,
    pub chat_id: Option<i64>,
}

/// Result of a successful send.
///
/// Ids are strings: numeric chat ids exceed 53-bit precision for some
/// consumers of the JSON output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub message_id: String,
    pub chat_id: String,
}

impl SendResult {
    pub fn from_sent(sent: SentMessage, chat: &ChatTarget) -> Self {
        Self {
            message_id: sent.message_id.to_string(),
            chat_id: sent
                .chat_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| chat.to_string()),
        }
    }
}

/// Message id as supplied by a caller before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum RawMessageId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for RawMessageId {
    fn from(v: i64) -> Self {
        RawMessageId::Int(v)
    }
}

impl From<i32> for RawMessageId {
    fn from(v: i32) -> Self {
        RawMessageId::Int(v.into())
    }
}

impl From<f64> for RawMessageId {
    fn from(v: f64) -> Self {
        RawMessageId::Float(v)
    }
}

impl From<&str> for RawMessageId {
    fn from(v: &str) -> Self {
        RawMessageId::Text(v.to_string())
    }
}

impl From<String> for RawMessageId {
    fn from(v: String) -> Self {
        RawMessageId::Text(v)
    }
}

impl fmt::Display for RawMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawMessageId::Int(v) => write!(f, "{v}"),
            RawMessageId::Float(v) => write!(f, "{v}"),
            RawMessageId::Text(v) => f.write_str(v),
        }
    }
}
