//! Telegram adapter (teloxide).
//!
//! Implements the `tgd-core` transport port over the Bot API. Methods newer
//! than teloxide 0.12 (`setMessageReaction`) go through [`bot_api`] directly.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode, Recipient},
};

pub mod bot_api;
mod errors;

pub use errors::map_request_error;

use tgd_core::{
    domain::{ChatTarget, MessageId, SentMessage, ThreadParams},
    errors::{Error, TransportError, TransportErrorKind, TransportResult},
    media::SendMethod,
    transport::{
        BotTransport, MediaUpload, TextFormat, TransportCapabilities, TransportConnector,
        WebhookConfig,
    },
    Result,
};

/// Applies caption and thread/reply linkage to any teloxide media request.
macro_rules! send_with_params {
    ($req:expr, $caption:expr, $thread:expr) => {{
        let mut req = $req;
        if let Some(c) = $caption {
            req = req.caption(c.to_string());
        }
        if let Some(t) = $thread.message_thread_id {
            req = req.message_thread_id(t);
        }
        if let Some(r) = $thread.reply_to_message_id {
            req = req.reply_to_message_id(teloxide::types::MessageId(r));
        }
        req.await
    }};
}

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot: Bot, http: reqwest::Client) -> Self {
        Self { bot, http }
    }

    fn recipient(chat: &ChatTarget) -> Recipient {
        match chat.numeric() {
            Some(id) => Recipient::Id(teloxide::types::ChatId(id)),
            None => Recipient::ChannelUsername(chat.to_string()),
        }
    }

    fn sent(msg: &teloxide::types::Message) -> SentMessage {
        SentMessage {
            message_id: msg.id.0,
            chat_id: Some(msg.chat.id.0),
        }
    }
}

#[async_trait]
impl BotTransport for TelegramTransport {
    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities {
            supports_reactions: true,
            supports_webhooks: true,
        }
    }

    async fn send_text(
        &self,
        chat: &ChatTarget,
        text: &str,
        format: TextFormat,
        thread: ThreadParams,
    ) -> TransportResult<SentMessage> {
        let mut req = self
            .bot
            .send_message(Self::recipient(chat), text.to_string());
        if format == TextFormat::Html {
            req = req.parse_mode(ParseMode::Html);
        }
        if let Some(t) = thread.message_thread_id {
            req = req.message_thread_id(t);
        }
        if let Some(r) = thread.reply_to_message_id {
            req = req.reply_to_message_id(teloxide::types::MessageId(r));
        }

        let msg = req.await.map_err(map_request_error)?;
        Ok(Self::sent(&msg))
    }

    async fn send_media(
        &self,
        chat: &ChatTarget,
        method: SendMethod,
        upload: &MediaUpload,
        caption: Option<&str>,
        thread: ThreadParams,
    ) -> TransportResult<SentMessage> {
        let to = Self::recipient(chat);
        let file = InputFile::memory(upload.bytes.clone()).file_name(upload.file_name.clone());

        let res = match method {
            SendMethod::Photo => send_with_params!(self.bot.send_photo(to, file), caption, thread),
            SendMethod::Video => send_with_params!(self.bot.send_video(to, file), caption, thread),
            SendMethod::Animation => {
                send_with_params!(self.bot.send_animation(to, file), caption, thread)
            }
            SendMethod::Audio => send_with_params!(self.bot.send_audio(to, file), caption, thread),
            SendMethod::Voice => send_with_params!(self.bot.send_voice(to, file), caption, thread),
            SendMethod::Document => {
                send_with_params!(self.bot.send_document(to, file), caption, thread)
            }
        };

        let msg = res.map_err(map_request_error)?;
        Ok(Self::sent(&msg))
    }

    async fn set_reaction(
        &self,
        chat: &ChatTarget,
        message_id: MessageId,
        emojis: &[String],
    ) -> TransportResult<()> {
        let payload = bot_api::SetMessageReaction::new(chat, message_id, emojis);
        bot_api::call(&self.http, &self.bot, "setMessageReaction", &payload).await
    }

    async fn set_webhook(&self, cfg: &WebhookConfig) -> TransportResult<()> {
        let url = reqwest::Url::parse(&cfg.url).map_err(|e| {
            TransportError::new(
                TransportErrorKind::Other,
                format!("invalid webhook url {:?}: {e}", cfg.url),
            )
        })?;

        let mut req = self
            .bot
            .set_webhook(url)
            .drop_pending_updates(cfg.drop_pending_updates);
        if let Some(secret) = &cfg.secret_token {
            req = req.secret_token(secret.clone());
        }
        req.await.map_err(map_request_error)?;
        Ok(())
    }

    async fn delete_webhook(&self) -> TransportResult<()> {
        self.bot
            .delete_webhook()
            .await
            .map_err(map_request_error)?;
        Ok(())
    }
}

/// Builds a [`TelegramTransport`] per bot token over one shared HTTP client.
#[derive(Clone)]
pub struct TeloxideConnector {
    http: reqwest::Client,
    api_url: Option<reqwest::Url>,
}

impl TeloxideConnector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            api_url: None,
        })
    }

    /// Point at a self-hosted Bot API server.
    pub fn with_api_url(mut self, url: reqwest::Url) -> Self {
        self.api_url = Some(url);
        self
    }
}

impl TransportConnector for TeloxideConnector {
    fn connect(&self, token: &str) -> Arc<dyn BotTransport> {
        let mut bot = Bot::with_client(token, self.http.clone());
        if let Some(url) = &self.api_url {
            bot = bot.set_api_url(url.clone());
        }
        Arc::new(TelegramTransport::new(bot, self.http.clone()))
    }
}
