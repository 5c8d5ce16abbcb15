use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "tgd",
    about = "Send messages, reactions and webhook registrations through the Telegram Bot API",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "api-url",
        env = "TELEGRAM_API_URL",
        global = true,
        help = "Bot API server base URL (defaults to https://api.telegram.org)"
    )]
    pub(crate) api_url: Option<String>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Send a text message or a media file to a chat.
    Send(SendArgs),
    /// Set or clear the bot's reaction on a message.
    React(ReactArgs),
    /// Manage the bot's webhook.
    #[command(subcommand)]
    Webhook(WebhookCommand),
}

#[derive(Debug, Args)]
pub(crate) struct AccountArgs {
    #[arg(long, help = "Account id from TELEGRAM_ACCOUNTS_FILE")]
    pub(crate) account: Option<String>,

    #[arg(long, help = "Bot token; overrides account configuration")]
    pub(crate) token: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct SendArgs {
    #[arg(long, help = "Chat id, @username, t.me link, or prefixed form (telegram:, tg:, group:)")]
    pub(crate) to: String,

    #[arg(long, default_value = "", help = "Message text (markdown), or the caption for --media")]
    pub(crate) message: String,

    #[arg(long, help = "Media URL or local path to upload")]
    pub(crate) media: Option<String>,

    #[arg(long = "max-bytes", help = "Download size limit for --media")]
    pub(crate) max_bytes: Option<u64>,

    #[arg(long, help = "Send audio as a voice note")]
    pub(crate) voice: bool,

    #[arg(long = "reply-to", help = "Message id to reply to")]
    pub(crate) reply_to: Option<i32>,

    #[arg(long, help = "Forum topic (message thread) id")]
    pub(crate) thread: Option<i32>,

    #[command(flatten)]
    pub(crate) account: AccountArgs,

    #[arg(long, help = "Log every retry at warn level")]
    pub(crate) verbose: bool,

    #[arg(long, help = "Print the result as JSON")]
    pub(crate) json: bool,
}

#[derive(Debug, Args)]
pub(crate) struct ReactArgs {
    #[arg(long)]
    pub(crate) chat: String,

    #[arg(long = "message-id")]
    pub(crate) message_id: String,

    #[arg(long, default_value = "", help = "Emoji to set; empty clears")]
    pub(crate) emoji: String,

    #[arg(long, help = "Clear the bot's reactions on the message")]
    pub(crate) remove: bool,

    #[command(flatten)]
    pub(crate) account: AccountArgs,

    #[arg(long)]
    pub(crate) verbose: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum WebhookCommand {
    /// Register a webhook URL.
    Set {
        #[arg(long)]
        url: String,

        #[arg(long, help = "Secret echoed in X-Telegram-Bot-Api-Secret-Token")]
        secret: Option<String>,

        #[arg(long = "drop-pending-updates")]
        drop_pending_updates: bool,

        #[command(flatten)]
        account: AccountArgs,
    },
    /// Remove the registered webhook.
    Delete {
        #[command(flatten)]
        account: AccountArgs,
    },
}
