use std::sync::Arc;

use crate::{
    errors::Error,
    transport::{BotTransport, WebhookConfig},
    Result,
};

use super::Dispatcher;

/// `setWebhook` request. Tokens are explicit here; webhook setup does not go through accounts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WebhookRegistration {
    pub token: String,
    pub url: String,
    pub secret: Option<String>,
    pub drop_pending_updates: bool,
}

fn require_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::MissingCredential {
            account_id: "webhook".to_string(),
        });
    }
    Ok(token)
}

impl Dispatcher {
    /// Register a webhook. One call, no retries.
    pub async fn set_webhook(&self, reg: &WebhookRegistration) -> Result<()> {
        let token = require_token(&reg.token)?;
        let cfg = WebhookConfig {
            url: reg.url.trim().to_string(),
            secret_token: reg
                .secret
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            drop_pending_updates: reg.drop_pending_updates,
        };

        self.webhook_transport(token)?
            .set_webhook(&cfg)
            .await
            .map_err(|e| Error::transport("setWebhook", e))?;

        tracing::info!(url = %cfg.url, "telegram webhook set");
        Ok(())
    }

    /// Remove the webhook. One call, no retries.
    pub async fn delete_webhook(&self, token: &str) -> Result<()> {
        let token = require_token(token)?;
        self.webhook_transport(token)?
            .delete_webhook()
            .await
            .map_err(|e| Error::transport("deleteWebhook", e))?;

        tracing::info!("telegram webhook deleted");
        Ok(())
    }

    fn webhook_transport(&self, token: &str) -> Result<Arc<dyn BotTransport>> {
        let transport = self.connector.connect(token);
        if !transport.capabilities().supports_webhooks {
            return Err(Error::UnsupportedCapability(
                "Webhooks are unavailable for this bot transport.",
            ));
        }
        Ok(transport)
    }
}
