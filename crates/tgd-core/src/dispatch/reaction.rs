use std::{fmt::Display, sync::Arc};

use crate::{
    domain::{ChatTarget, MessageId, RawMessageId},
    errors::Error,
    recipient::{normalize_chat_id, normalize_message_id},
    transport::BotTransport,
    Result,
};

use super::{
    retry::{RetryConfig, RetryRunner},
    Dispatcher,
};

#[derive(Clone, Default)]
pub struct ReactionOptions {
    pub account_id: Option<String>,
    pub token: Option<String>,
    /// Clear the bot's reactions instead of setting one.
    pub remove: bool,
    pub retry: Option<RetryConfig>,
    pub verbose: bool,
    pub transport: Option<Arc<dyn BotTransport>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactionRequest {
    pub chat: ChatTarget,
    pub message_id: MessageId,
    pub emoji: Option<String>,
    pub remove: bool,
}

impl ReactionRequest {
    /// Reaction set to send; empty clears all of the bot's reactions.
    pub fn reactions(&self) -> Vec<String> {
        if self.remove {
            return Vec::new();
        }
        self.emoji
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| vec![e.to_string()])
            .unwrap_or_default()
    }
}

impl Dispatcher {
    /// Set (or clear) the bot's reaction on a message. Single retried call, no fallback.
    pub async fn react(
        &self,
        chat: impl Display,
        message_id: impl Into<RawMessageId>,
        emoji: &str,
        opts: &ReactionOptions,
    ) -> Result<()> {
        let call = self.prepare(
            opts.account_id.as_deref(),
            opts.token.as_deref(),
            opts.transport.as_ref(),
            opts.retry,
        )?;
        let request = ReactionRequest {
            chat: normalize_chat_id(&chat.to_string())?,
            message_id: normalize_message_id(&message_id.into())?,
            emoji: Some(emoji.to_string()),
            remove: opts.remove,
        };
        let reactions = request.reactions();

        let transport = call.transport.as_ref();
        if !transport.capabilities().supports_reactions {
            return Err(Error::UnsupportedCapability(
                "Telegram reactions are unavailable in this bot API.",
            ));
        }

        let runner = RetryRunner::new(call.policy.as_ref(), opts.verbose);
        let (chat, message_id, reactions) = (&request.chat, request.message_id, &reactions[..]);
        runner
            .attempt("reaction", move || {
                transport.set_reaction(chat, message_id, reactions)
            })
            .await
            .map_err(|e| Error::transport("reaction", e))?;

        tracing::debug!(
            chat = %request.chat,
            message_id = request.message_id.0,
            cleared = reactions.is_empty(),
            "telegram reaction set"
        );
        Ok(())
    }
}
