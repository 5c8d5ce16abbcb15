//! Recipient normalization (raw user/agent input → Bot API chat id).
//!
//! Accepted spellings:
//! - `telegram:<id>`, `tg:<id>`, `telegram:group:<id>` (internal session prefixes)
//! - `https://t.me/<name>` / `t.me/<name>` (public chats and channels)
//! - `@name`, `-100123`, or a bare `name` of at least 5 characters

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    domain::{ChatTarget, MessageId, RawMessageId},
    errors::Error,
    Result,
};

fn prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(telegram|tg|group):").expect("valid regex"))
}

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Invite links (`t.me/+...`) are not resolvable via the Bot API and stay untouched.
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:https?://)?t\.me/([A-Za-z0-9_]+)$").expect("valid regex")
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\d+$").expect("valid regex"))
}

fn bare_username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{5,}$").expect("valid regex"))
}

/// Map a raw recipient to its canonical chat id.
pub fn normalize_chat_id(to: &str) -> Result<ChatTarget> {
    let mut normalized = to.trim();
    if normalized.is_empty() {
        return Err(Error::EmptyRecipient);
    }

    // `telegram:group:<id>` carries two prefixes.
    while let Some(m) = prefix_re().find(normalized) {
        normalized = normalized[m.end()..].trim();
    }

    let normalized = match link_re().captures(normalized) {
        Some(caps) => format!("@{}", &caps[1]),
        None => normalized.to_string(),
    };

    if normalized.is_empty() {
        return Err(Error::EmptyRecipient);
    }
    if normalized.starts_with('@') || numeric_re().is_match(&normalized) {
        return Ok(ChatTarget::new(normalized));
    }
    if bare_username_re().is_match(&normalized) {
        return Ok(ChatTarget::new(format!("@{normalized}")));
    }

    Ok(ChatTarget::new(normalized))
}

/// Normalize a caller-supplied message id.
///
/// Floats truncate toward zero; strings parse their leading integer
/// (`"42"`, `" 42 "`, `"42.9"` → 42).
pub fn normalize_message_id(raw: &RawMessageId) -> Result<MessageId> {
    let invalid = || Error::InvalidMessageId(raw.to_string());

    let value: i64 = match raw {
        RawMessageId::Int(v) => *v,
        RawMessageId::Float(v) if v.is_finite() => v.trunc() as i64,
        RawMessageId::Float(_) => return Err(invalid()),
        RawMessageId::Text(s) => parse_leading_int(s.trim()).ok_or_else(invalid)?,
    };

    i32::try_from(value).map(MessageId).map_err(|_| invalid())
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'-' => (-1, &s[1..]),
        b'+' => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}
