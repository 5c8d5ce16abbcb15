//! In-memory transport doubles for dispatcher tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    config::{AccountConfig, Config},
    domain::{ChatTarget, MessageId, SentMessage, ThreadParams},
    errors::{Error, TransportError, TransportErrorKind, TransportResult},
    media::{FetchedMedia, MediaFetcher, SendMethod},
    transport::{
        BotTransport, MediaUpload, TextFormat, TransportCapabilities, TransportConnector,
        WebhookConfig,
    },
    Result,
};

use super::{Dispatcher, RetryConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Text {
        chat: String,
        text: String,
        format: TextFormat,
        thread: ThreadParams,
    },
    Media {
        chat: String,
        method: SendMethod,
        file_name: String,
        caption: Option<String>,
        thread: ThreadParams,
    },
    Reaction {
        chat: String,
        message_id: i32,
        emojis: Vec<String>,
    },
    SetWebhook(WebhookConfig),
    DeleteWebhook,
}

/// Records every call; pops a scripted failure per call until the script runs out.
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<TransportError>>,
    supports_reactions: bool,
    supports_webhooks: bool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Self::scripted(Vec::new())
    }

    pub fn scripted(failures: Vec<TransportError>) -> Arc<Self> {
        Self::build(failures.into(), true, true)
    }

    pub fn without_reactions() -> Arc<Self> {
        Self::build(VecDeque::new(), false, true)
    }

    pub fn without_webhooks() -> Arc<Self> {
        Self::build(VecDeque::new(), true, false)
    }

    fn build(
        failures: VecDeque<TransportError>,
        supports_reactions: bool,
        supports_webhooks: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(failures),
            supports_reactions,
            supports_webhooks,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> TransportResult<SentMessage> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(SentMessage {
            message_id: 100 + calls.len() as i32,
            chat_id: None,
        })
    }
}

#[async_trait]
impl BotTransport for MockTransport {
    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities {
            supports_reactions: self.supports_reactions,
            supports_webhooks: self.supports_webhooks,
        }
    }

    async fn send_text(
        &self,
        chat: &ChatTarget,
        text: &str,
        format: TextFormat,
        thread: ThreadParams,
    ) -> TransportResult<SentMessage> {
        self.record(Call::Text {
            chat: chat.to_string(),
            text: text.to_string(),
            format,
            thread,
        })
    }

    async fn send_media(
        &self,
        chat: &ChatTarget,
        method: SendMethod,
        upload: &MediaUpload,
        caption: Option<&str>,
        thread: ThreadParams,
    ) -> TransportResult<SentMessage> {
        self.record(Call::Media {
            chat: chat.to_string(),
            method,
            file_name: upload.file_name.clone(),
            caption: caption.map(str::to_string),
            thread,
        })
    }

    async fn set_reaction(
        &self,
        chat: &ChatTarget,
        message_id: MessageId,
        emojis: &[String],
    ) -> TransportResult<()> {
        self.record(Call::Reaction {
            chat: chat.to_string(),
            message_id: message_id.0,
            emojis: emojis.to_vec(),
        })
        .map(|_| ())
    }

    async fn set_webhook(&self, cfg: &WebhookConfig) -> TransportResult<()> {
        self.record(Call::SetWebhook(cfg.clone())).map(|_| ())
    }

    async fn delete_webhook(&self) -> TransportResult<()> {
        self.record(Call::DeleteWebhook).map(|_| ())
    }
}

/// Hands out the same mock for every token and remembers which tokens were used.
pub struct MockConnector {
    pub transport: Arc<MockTransport>,
    pub tokens: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(transport: Arc<MockTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            tokens: Mutex::new(Vec::new()),
        })
    }
}

impl TransportConnector for MockConnector {
    fn connect(&self, token: &str) -> Arc<dyn BotTransport> {
        self.tokens.lock().unwrap().push(token.to_string());
        self.transport.clone()
    }
}

/// Returns a fixed payload for any source.
pub struct StaticFetcher {
    pub media: FetchedMedia,
    pub sources: Mutex<Vec<(String, u64)>>,
}

impl StaticFetcher {
    pub fn new(content_type: Option<&str>, file_name: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            media: FetchedMedia {
                bytes: vec![1, 2, 3],
                content_type: content_type.map(str::to_string),
                file_name: file_name.map(str::to_string),
            },
            sources: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MediaFetcher for StaticFetcher {
    async fn fetch(&self, source: &str, max_bytes: u64) -> Result<FetchedMedia> {
        self.sources
            .lock()
            .unwrap()
            .push((source.to_string(), max_bytes));
        if self.media.bytes.len() as u64 > max_bytes {
            return Err(Error::MediaTooLarge { limit: max_bytes });
        }
        Ok(self.media.clone())
    }
}

pub fn test_config() -> Config {
    let mut cfg = Config {
        retry: RetryConfig {
            attempts: 3,
            min_delay_ms: 0,
            max_delay_ms: 0,
        },
        ..Config::default()
    };
    cfg.accounts.insert(
        "default".to_string(),
        AccountConfig {
            bot_token: Some("123:test".to_string()),
            ..AccountConfig::default()
        },
    );
    cfg
}

pub fn dispatcher(
    transport: Arc<MockTransport>,
    fetcher: Arc<StaticFetcher>,
) -> (Dispatcher, Arc<MockConnector>) {
    let connector = MockConnector::new(transport);
    let dispatcher = Dispatcher::new(Arc::new(test_config()), connector.clone(), fetcher);
    (dispatcher, connector)
}

pub fn parse_error() -> TransportError {
    TransportError::new(
        TransportErrorKind::Api,
        "400: Bad Request: can't parse entities: Unsupported start tag \"foo\" at byte offset 0",
    )
}

pub fn chat_not_found() -> TransportError {
    TransportError::new(TransportErrorKind::ChatNotFound, "400: Bad Request: chat not found")
}

pub fn network_error() -> TransportError {
    TransportError::new(TransportErrorKind::Network, "connection reset by peer")
}
