use std::sync::Arc;

use crate::{
    domain::{ChatTarget, SendResult, ThreadParams},
    errors::Error,
    formatting::convert_markdown_to_html,
    media::{classify, SendMethod},
    recipient::normalize_chat_id,
    transport::{BotTransport, MediaUpload, TextFormat},
    Result,
};

use super::{
    classify::{classify_error, rewrite_target_missing, ErrorClass},
    retry::{RetryConfig, RetryRunner},
    Dispatcher,
};

/// Caller-facing options for [`Dispatcher::send_message`].
#[derive(Clone, Default)]
pub struct SendOptions {
    pub account_id: Option<String>,
    /// Overrides the account's bot token.
    pub token: Option<String>,
    pub media_url: Option<String>,
    pub max_bytes: Option<u64>,
    /// Send audio as a voice bubble instead of an audio file.
    pub as_voice: bool,
    pub reply_to_message_id: Option<i32>,
    /// Forum topic thread id (forum supergroups).
    pub message_thread_id: Option<i32>,
    pub retry: Option<RetryConfig>,
    pub verbose: bool,
    /// Use this transport instead of connecting with the resolved token.
    pub transport: Option<Arc<dyn BotTransport>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundContent {
    Text {
        body: String,
    },
    Media {
        source_url: String,
        max_bytes: Option<u64>,
        as_voice: bool,
        caption: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundIntent {
    pub content: OutboundContent,
    pub thread: ThreadParams,
}

impl OutboundIntent {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            content: OutboundContent::Text { body: body.into() },
            thread: ThreadParams::default(),
        }
    }

    pub fn media(source_url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            content: OutboundContent::Media {
                source_url: source_url.into(),
                max_bytes: None,
                as_voice: false,
                caption,
            },
            thread: ThreadParams::default(),
        }
    }

    pub fn with_thread(mut self, thread: ThreadParams) -> Self {
        self.thread = thread;
        self
    }

    /// A non-blank `media_url` selects the media path; `text` then becomes the caption.
    pub fn from_options(text: &str, opts: &SendOptions) -> Self {
        let thread = ThreadParams {
            message_thread_id: opts.message_thread_id,
            reply_to_message_id: opts.reply_to_message_id,
        };
        let media_url = opts
            .media_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());

        let content = match media_url {
            Some(url) => OutboundContent::Media {
                source_url: url.to_string(),
                max_bytes: opts.max_bytes,
                as_voice: opts.as_voice,
                caption: Some(text.to_string()),
            },
            None => OutboundContent::Text {
                body: text.to_string(),
            },
        };
        Self { content, thread }
    }
}

impl Dispatcher {
    /// Send text, or media when `opts.media_url` is set.
    pub async fn send_message(&self, to: &str, text: &str, opts: &SendOptions) -> Result<SendResult> {
        self.send(to, OutboundIntent::from_options(text, opts), opts)
            .await
    }

    /// Deliver one intent to one recipient.
    ///
    /// Only the account, token, retry, verbose and transport fields of `opts`
    /// apply here; the content comes from `intent`.
    pub async fn send(
        &self,
        to: &str,
        intent: OutboundIntent,
        opts: &SendOptions,
    ) -> Result<SendResult> {
        let call = self.prepare(
            opts.account_id.as_deref(),
            opts.token.as_deref(),
            opts.transport.as_ref(),
            opts.retry,
        )?;
        let chat = normalize_chat_id(to)?;
        let runner = RetryRunner::new(call.policy.as_ref(), opts.verbose);
        let transport = call.transport.as_ref();

        let result = match intent.content {
            OutboundContent::Media {
                source_url,
                max_bytes,
                as_voice,
                caption,
            } => {
                let max_bytes = max_bytes.unwrap_or(self.config.media_max_bytes);
                self.send_media_payload(
                    transport,
                    &runner,
                    &chat,
                    &source_url,
                    max_bytes,
                    as_voice,
                    caption.as_deref(),
                    intent.thread,
                )
                .await
            }
            OutboundContent::Text { body } => {
                send_text_payload(transport, &runner, &chat, &body, intent.thread).await
            }
        };

        let result = result.map_err(|e| rewrite_target_missing(e, &chat, to))?;
        tracing::debug!(
            chat = %chat,
            message_id = %result.message_id,
            "telegram send ok"
        );
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_media_payload(
        &self,
        transport: &dyn BotTransport,
        runner: &RetryRunner<'_>,
        chat: &ChatTarget,
        source_url: &str,
        max_bytes: u64,
        as_voice: bool,
        caption: Option<&str>,
        thread: ThreadParams,
    ) -> Result<SendResult> {
        let media = self.fetcher.fetch(source_url, max_bytes).await?;
        let kind = classify(media.content_type.as_deref(), media.file_name.as_deref());
        let method = SendMethod::for_kind(kind, as_voice);
        let upload = MediaUpload {
            file_name: media
                .file_name
                .unwrap_or_else(|| kind.default_file_name().to_string()),
            bytes: media.bytes,
        };
        let caption = caption.map(str::trim).filter(|c| !c.is_empty());

        tracing::debug!(
            chat = %chat,
            method = method.label(),
            bytes = upload.bytes.len(),
            "sending media"
        );

        let upload = &upload;
        let sent = runner
            .attempt(method.label(), move || {
                transport.send_media(chat, method, upload, caption, thread)
            })
            .await
            .map_err(|e| Error::transport(method.label(), e))?;

        Ok(SendResult::from_sent(sent, chat))
    }
}

/// Send as HTML; on an entity parse error resend the original text once without formatting.
async fn send_text_payload(
    transport: &dyn BotTransport,
    runner: &RetryRunner<'_>,
    chat: &ChatTarget,
    body: &str,
    thread: ThreadParams,
) -> Result<SendResult> {
    if body.trim().is_empty() {
        return Err(Error::EmptyMessageBody);
    }

    let html = convert_markdown_to_html(body);
    let html = html.as_str();

    let primary = runner
        .attempt("message", move || {
            transport.send_text(chat, html, TextFormat::Html, thread)
        })
        .await;

    let sent = match primary {
        Ok(sent) => sent,
        Err(err) if classify_error(&err) == ErrorClass::ParseFormat => {
            if runner.verbose() {
                tracing::warn!("telegram HTML parse failed, retrying as plain text: {err}");
            } else {
                tracing::debug!("telegram HTML parse failed, retrying as plain text: {err}");
            }
            runner
                .attempt("message-plain", move || {
                    transport.send_text(chat, body, TextFormat::Plain, thread)
                })
                .await
                .map_err(|e| Error::transport("message-plain", e))?
        }
        Err(err) => return Err(Error::transport("message", err)),
    };

    Ok(SendResult::from_sent(sent, chat))
}
