//! Direct Bot API calls for methods teloxide 0.12 does not expose.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use teloxide::Bot;

use tgd_core::{
    domain::{ChatTarget, MessageId},
    errors::{TransportError, TransportErrorKind, TransportResult},
};

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatIdParam<'a> {
    Id(i64),
    Username(&'a str),
}

impl<'a> From<&'a ChatTarget> for ChatIdParam<'a> {
    fn from(chat: &'a ChatTarget) -> Self {
        match chat.numeric() {
            Some(id) => ChatIdParam::Id(id),
            None => ChatIdParam::Username(chat.as_str()),
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ReactionTypeEmoji<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub emoji: &'a str,
}

/// `setMessageReaction` body. An empty `reaction` list clears the bot's reactions.
#[derive(Debug, PartialEq, Serialize)]
pub struct SetMessageReaction<'a> {
    pub chat_id: ChatIdParam<'a>,
    pub message_id: i32,
    pub reaction: Vec<ReactionTypeEmoji<'a>>,
}

impl<'a> SetMessageReaction<'a> {
    pub fn new(chat: &'a ChatTarget, message_id: MessageId, emojis: &'a [String]) -> Self {
        Self {
            chat_id: chat.into(),
            message_id: message_id.0,
            reaction: emojis
                .iter()
                .map(|emoji| ReactionTypeEmoji {
                    kind: "emoji",
                    emoji,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
    migrate_to_chat_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    error_code: Option<i64>,
    parameters: Option<ResponseParameters>,
}

/// POST `method` with a JSON body and check the `{ok, ...}` envelope.
pub async fn call<P: Serialize + ?Sized>(
    http: &reqwest::Client,
    bot: &Bot,
    method: &str,
    payload: &P,
) -> TransportResult<()> {
    let url = method_url(bot, method)?;

    tracing::debug!(method, "bot api call");

    let resp = http.post(url).json(payload).send().await.map_err(|e| {
        TransportError::new(TransportErrorKind::Network, format!("{method}: {e}"))
    })?;
    let body = resp.text().await.map_err(|e| {
        TransportError::new(TransportErrorKind::Network, format!("{method}: {e}"))
    })?;

    parse_response(&body)
}

fn method_url(bot: &Bot, method: &str) -> TransportResult<reqwest::Url> {
    let mut url = bot.api_url();
    url.path_segments_mut()
        .map_err(|_| {
            TransportError::new(TransportErrorKind::Other, "bot api url cannot be a base")
        })?
        .pop_if_empty()
        .push(&format!("bot{}", bot.token()))
        .push(method);
    Ok(url)
}

fn parse_response(body: &str) -> TransportResult<()> {
    let resp: ApiResponse = serde_json::from_str(body).map_err(|e| {
        TransportError::new(
            TransportErrorKind::Other,
            format!("invalid bot api response: {e}"),
        )
    })?;
    if resp.ok {
        return Ok(());
    }
    Err(api_error(resp))
}

fn api_error(resp: ApiResponse) -> TransportError {
    let code = resp.error_code.unwrap_or_default();
    let description = resp.description.unwrap_or_else(|| "unknown error".to_string());
    let message = format!("{code}: {description}");
    let params = resp.parameters;

    if code == 429 {
        let err = TransportError::new(TransportErrorKind::RateLimited, message);
        return match params.and_then(|p| p.retry_after) {
            Some(secs) => err.with_retry_after(Duration::from_secs(secs)),
            None => err,
        };
    }
    if let Some(new_id) = params.and_then(|p| p.migrate_to_chat_id) {
        return TransportError::new(
            TransportErrorKind::Api,
            format!("{message} (group migrated to {new_id})"),
        );
    }

    let lower = description.to_ascii_lowercase();
    let kind = if lower.contains("chat not found") {
        TransportErrorKind::ChatNotFound
    } else if lower.contains("parse entities") {
        TransportErrorKind::ParseEntities
    } else {
        TransportErrorKind::Api
    };
    TransportError::new(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgd_core::recipient::normalize_chat_id;

    #[test]
    fn reaction_payload_shape() {
        let chat = normalize_chat_id("-100123").unwrap();
        let emojis = vec!["👍".to_string()];
        let body = serde_json::to_value(SetMessageReaction::new(&chat, MessageId(9), &emojis))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "chat_id": -100123,
                "message_id": 9,
                "reaction": [{"type": "emoji", "emoji": "👍"}]
            })
        );

        let chat = normalize_chat_id("@chan").unwrap();
        let body =
            serde_json::to_value(SetMessageReaction::new(&chat, MessageId(1), &[])).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"chat_id": "@chan", "message_id": 1, "reaction": []})
        );
    }

    #[test]
    fn method_url_keeps_token_in_path() {
        let bot = Bot::new("123:abc");
        let url = method_url(&bot, "setMessageReaction").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.telegram.org/bot123:abc/setMessageReaction"
        );
    }

    #[test]
    fn ok_response() {
        assert!(parse_response(r#"{"ok":true,"result":true}"#).is_ok());
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err = parse_response(
            r#"{"ok":false,"error_code":429,"description":"Too Many Requests: retry after 7","parameters":{"retry_after":7}}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::RateLimited);
        assert_eq!(err.retry_after, Some(Duration::from_secs(7)));
        assert!(err.message.starts_with("429:"));
    }

    #[test]
    fn chat_not_found_keeps_bot_api_text() {
        let err = parse_response(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::ChatNotFound);
        assert_eq!(err.message, "400: Bad Request: chat not found");
    }

    #[test]
    fn unknown_reaction_is_plain_api_error() {
        let err = parse_response(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: REACTION_INVALID"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Api);
    }

    #[test]
    fn garbage_body_is_reported() {
        let err = parse_response("<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Other);
    }
}
