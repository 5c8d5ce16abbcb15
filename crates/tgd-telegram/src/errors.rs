use teloxide::{ApiError, RequestError};

use tgd_core::errors::{TransportError, TransportErrorKind};

/// Map a teloxide request failure onto the core transport error.
///
/// The message keeps teloxide's rendering so text-based classification still
/// works for API errors teloxide does not model. Detailed entity errors
/// (`can't parse entities: ...`) arrive as `ApiError::Unknown`.
pub fn map_request_error(e: RequestError) -> TransportError {
    let kind = match &e {
        RequestError::Api(ApiError::ChatNotFound) => TransportErrorKind::ChatNotFound,
        RequestError::Api(ApiError::CantParseEntities) => TransportErrorKind::ParseEntities,
        RequestError::RetryAfter(_) => TransportErrorKind::RateLimited,
        RequestError::Network(_) | RequestError::Io(_) => TransportErrorKind::Network,
        RequestError::Api(_) | RequestError::MigrateToChatId(_) => TransportErrorKind::Api,
        _ => TransportErrorKind::Other,
    };
    let message = match kind {
        TransportErrorKind::ChatNotFound => "400: Bad Request: chat not found".to_string(),
        TransportErrorKind::RateLimited => format!("429: {e}"),
        _ => e.to_string(),
    };
    let err = TransportError::new(kind, message);
    match e {
        RequestError::RetryAfter(delay) => err.with_retry_after(delay),
        _ => err,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tgd_core::dispatch::{classify_error, BackoffPolicy, ErrorClass, RetryConfig, RetryPolicy};

    use super::*;

    #[test]
    fn chat_not_found_is_typed() {
        let err = map_request_error(RequestError::Api(ApiError::ChatNotFound));
        assert_eq!(err.kind, TransportErrorKind::ChatNotFound);
        assert!(err.message.contains("chat not found"));
    }

    #[test]
    fn entity_errors_are_typed() {
        let err = map_request_error(RequestError::Api(ApiError::CantParseEntities));
        assert_eq!(err.kind, TransportErrorKind::ParseEntities);
        assert_eq!(classify_error(&err), ErrorClass::ParseFormat);
    }

    #[test]
    fn detailed_entity_errors_fall_back_to_text() {
        let err = map_request_error(RequestError::Api(ApiError::Unknown(
            "Bad Request: can't parse entities: Unsupported start tag \"span\" at byte offset 3"
                .to_string(),
        )));
        assert_eq!(err.kind, TransportErrorKind::Api);
        assert_eq!(classify_error(&err), ErrorClass::ParseFormat);
    }

    #[test]
    fn rate_limit_keeps_server_delay() {
        let err = map_request_error(RequestError::RetryAfter(Duration::from_secs(12)));
        assert_eq!(err.kind, TransportErrorKind::RateLimited);
        assert_eq!(err.retry_after, Some(Duration::from_secs(12)));

        let policy = BackoffPolicy::new(RetryConfig {
            attempts: 3,
            min_delay_ms: 400,
            max_delay_ms: 30_000,
        });
        assert_eq!(policy.backoff(1, &err), Duration::from_secs(12));
    }

    #[test]
    fn other_api_errors_keep_their_text() {
        let err = map_request_error(RequestError::Api(ApiError::BotBlocked));
        assert_eq!(err.kind, TransportErrorKind::Api);
        assert!(!err.message.is_empty());
    }
}
