//! Outbound dispatch: sends, reactions and webhook registration.
//!
//! Every public operation is self-contained: it resolves its account and
//! token, builds a transport and a retry policy, and drops all of it on return.

pub mod classify;
pub mod reaction;
pub mod retry;
pub mod send;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::{
    config::{resolve_token, Config},
    media::MediaFetcher,
    transport::{BotTransport, TransportConnector},
    Result,
};

pub use classify::{classify_error, rewrite_target_missing, ErrorClass};
pub use reaction::{ReactionOptions, ReactionRequest};
pub use retry::{BackoffPolicy, RetryConfig, RetryPolicy, RetryRunner};
pub use send::{OutboundContent, OutboundIntent, SendOptions};
pub use webhook::WebhookRegistration;

/// Entry point for outbound Telegram operations.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<Config>,
    connector: Arc<dyn TransportConnector>,
    fetcher: Arc<dyn MediaFetcher>,
    policy: Option<Arc<dyn RetryPolicy>>,
}

/// Transport and retry policy resolved for one call.
struct CallContext {
    transport: Arc<dyn BotTransport>,
    policy: Arc<dyn RetryPolicy>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        connector: Arc<dyn TransportConnector>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Self {
        Self {
            config,
            connector,
            fetcher,
            policy: None,
        }
    }

    /// Use a custom retry policy instead of the configured backoff.
    ///
    /// A per-call `retry` option still takes precedence.
    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn prepare(
        &self,
        account_id: Option<&str>,
        token: Option<&str>,
        transport: Option<&Arc<dyn BotTransport>>,
        retry: Option<RetryConfig>,
    ) -> Result<CallContext> {
        let account = self.config.resolve_account(account_id);
        let token = resolve_token(token, &account)?;

        let transport = match transport {
            Some(t) => Arc::clone(t),
            None => self.connector.connect(&token),
        };

        let policy: Arc<dyn RetryPolicy> = match (retry, &self.policy) {
            (Some(cfg), _) => Arc::new(BackoffPolicy::new(cfg)),
            (None, Some(p)) => Arc::clone(p),
            (None, None) => Arc::new(BackoffPolicy::new(
                account.retry.unwrap_or(self.config.retry),
            )),
        };

        Ok(CallContext { transport, policy })
    }
}
