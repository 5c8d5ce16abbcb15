//! Bot API transport port.
//!
//! The dispatch core talks to Telegram only through these traits; the
//! teloxide adapter lives in `tgd-telegram`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    domain::{ChatTarget, MessageId, SentMessage, ThreadParams},
    errors::TransportResult,
    media::SendMethod,
};

/// Feature flags of a transport implementation.
#[derive(Clone, Copy, Debug)]
pub struct TransportCapabilities {
    pub supports_reactions: bool,
    pub supports_webhooks: bool,
}

/// How the Bot API should interpret message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    Html,
    Plain,
}

/// An in-memory file ready for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
    pub secret_token: Option<String>,
    pub drop_pending_updates: bool,
}

#[async_trait]
pub trait BotTransport: Send + Sync {
    fn capabilities(&self) -> TransportCapabilities;

    async fn send_text(
        &self,
        chat: &ChatTarget,
        text: &str,
        format: TextFormat,
        thread: ThreadParams,
    ) -> TransportResult<SentMessage>;

    async fn send_media(
        &self,
        chat: &ChatTarget,
        method: SendMethod,
        upload: &MediaUpload,
        caption: Option<&str>,
        thread: ThreadParams,
    ) -> TransportResult<SentMessage>;

    /// Replace the bot's reactions on a message; an empty slice clears them.
    async fn set_reaction(
        &self,
        chat: &ChatTarget,
        message_id: MessageId,
        emojis: &[String],
    ) -> TransportResult<()>;

    async fn set_webhook(&self, cfg: &WebhookConfig) -> TransportResult<()>;
    async fn delete_webhook(&self) -> TransportResult<()>;
}

/// Builds a transport bound to one bot token.
pub trait TransportConnector: Send + Sync {
    fn connect(&self, token: &str) -> Arc<dyn BotTransport>;
}
