use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tgd_core::{
    config::{resolve_token, Config},
    dispatch::{ReactionOptions, SendOptions, WebhookRegistration},
    media::HttpMediaFetcher,
    Dispatcher,
};
use tgd_telegram::TeloxideConnector;

mod cli;

use cli::{AccountArgs, Cli, Command, WebhookCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tgd_core::logging::init("tgd")?;

    let cfg = Arc::new(Config::load()?);

    let mut connector = TeloxideConnector::new(cfg.http_timeout)?;
    if let Some(url) = &cli.api_url {
        let url = url
            .parse()
            .with_context(|| format!("invalid --api-url {url:?}"))?;
        connector = connector.with_api_url(url);
    }
    let fetcher = HttpMediaFetcher::new(cfg.http_timeout)?;
    let dispatcher = Dispatcher::new(cfg.clone(), Arc::new(connector), Arc::new(fetcher));

    match cli.command {
        Command::Send(args) => {
            let opts = SendOptions {
                account_id: args.account.account,
                token: args.account.token,
                media_url: args.media,
                max_bytes: args.max_bytes,
                as_voice: args.voice,
                reply_to_message_id: args.reply_to,
                message_thread_id: args.thread,
                verbose: args.verbose,
                ..SendOptions::default()
            };
            let result = dispatcher
                .send_message(&args.to, &args.message, &opts)
                .await
                .context("send failed")?;

            if args.json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                println!("sent message {} to {}", result.message_id, result.chat_id);
            }
        }
        Command::React(args) => {
            let opts = ReactionOptions {
                account_id: args.account.account,
                token: args.account.token,
                remove: args.remove,
                verbose: args.verbose,
                ..ReactionOptions::default()
            };
            dispatcher
                .react(&args.chat, args.message_id.as_str(), &args.emoji, &opts)
                .await
                .context("reaction failed")?;
        }
        Command::Webhook(WebhookCommand::Set {
            url,
            secret,
            drop_pending_updates,
            account,
        }) => {
            let reg = WebhookRegistration {
                token: webhook_token(&cfg, &account)?,
                url,
                secret,
                drop_pending_updates,
            };
            dispatcher
                .set_webhook(&reg)
                .await
                .context("setWebhook failed")?;
        }
        Command::Webhook(WebhookCommand::Delete { account }) => {
            let token = webhook_token(&cfg, &account)?;
            dispatcher
                .delete_webhook(&token)
                .await
                .context("deleteWebhook failed")?;
        }
    }

    Ok(())
}

fn webhook_token(cfg: &Config, account: &AccountArgs) -> tgd_core::Result<String> {
    let resolved = cfg.resolve_account(account.account.as_deref());
    resolve_token(account.token.as_deref(), &resolved)
}
