//! Classification of Bot API failures.
//!
//! The typed [`TransportErrorKind`] is authoritative when the adapter could
//! map the failure. Otherwise the error text is matched against known Bot API
//! descriptions; those strings are not a stable contract and may drift between
//! Bot API / client library versions.

use std::sync::OnceLock;

use regex::Regex;

use crate::{
    domain::ChatTarget,
    errors::{Error, TransportError, TransportErrorKind},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rich-text entities were rejected; the text path may resend as plain text.
    ParseFormat,
    /// The recipient chat does not exist or the bot cannot reach it.
    TargetMissing,
    /// Left to the retry policy.
    Other,
}

fn parse_err_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)can't parse entities|parse entities|find end of the entity")
            .expect("valid regex")
    })
}

fn chat_not_found_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)400: Bad Request: chat not found").expect("valid regex"))
}

pub fn classify_error(err: &TransportError) -> ErrorClass {
    match err.kind {
        TransportErrorKind::ParseEntities => return ErrorClass::ParseFormat,
        TransportErrorKind::ChatNotFound => return ErrorClass::TargetMissing,
        _ => {}
    }
    if parse_err_re().is_match(&err.message) {
        ErrorClass::ParseFormat
    } else if chat_not_found_re().is_match(&err.message) {
        ErrorClass::TargetMissing
    } else {
        ErrorClass::Other
    }
}

/// Replace a "chat not found" transport error with an actionable one.
///
/// Anything else passes through untouched, so applying this twice is the
/// same as applying it once.
pub fn rewrite_target_missing(err: Error, chat: &ChatTarget, input: &str) -> Error {
    match err {
        Error::Transport { ref source, .. }
            if classify_error(source) == ErrorClass::TargetMissing =>
        {
            Error::ChatNotFound {
                chat_id: chat.to_string(),
                input: input.to_string(),
            }
        }
        other => other,
    }
}
