use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{dispatch::retry::RetryConfig, errors::Error, Result};

pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Telegram bots may upload files up to 50 MB.
pub const DEFAULT_MEDIA_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Per-bot settings. Tokens are read lazily so a rotated token file is picked up on the next call.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountConfig {
    pub bot_token: Option<String>,
    pub token_file: Option<PathBuf>,
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AccountsFile {
    default_account: Option<String>,
    accounts: BTreeMap<String, AccountConfig>,
}

/// Typed configuration, loaded once and passed explicitly to the dispatcher.
#[derive(Clone, Debug)]
pub struct Config {
    pub default_account: String,
    pub accounts: BTreeMap<String, AccountConfig>,
    /// `TELEGRAM_BOT_TOKEN`, used for the default account only.
    pub env_token: Option<String>,
    pub retry: RetryConfig,
    pub media_max_bytes: u64,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_account: DEFAULT_ACCOUNT_ID.to_string(),
            accounts: BTreeMap::new(),
            env_token: None,
            retry: RetryConfig::default(),
            media_max_bytes: DEFAULT_MEDIA_MAX_BYTES,
            http_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
    Config,
    TokenFile,
    Env,
    None,
}

/// Account settings resolved for one call.
#[derive(Clone, Debug)]
pub struct ResolvedAccount {
    pub account_id: String,
    /// Empty when no source provided a token.
    pub token: String,
    pub token_source: TokenSource,
    pub retry: Option<RetryConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let mut cfg = match env_str("TELEGRAM_ACCOUNTS_FILE").and_then(non_empty) {
            Some(path) => {
                let raw = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("cannot read TELEGRAM_ACCOUNTS_FILE {path}: {e}"))
                })?;
                Self::from_accounts_json(&raw)?
            }
            None => Self::default(),
        };

        cfg.env_token = env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty);
        if let Some(path) = env_path("TELEGRAM_TOKEN_FILE") {
            let default_id = cfg.default_account.clone();
            let account = cfg.accounts.entry(default_id).or_default();
            if account.token_file.is_none() {
                account.token_file = Some(path);
            }
        }

        if let Some(v) = env_u32("TELEGRAM_RETRY_ATTEMPTS") {
            cfg.retry.attempts = v;
        }
        if let Some(v) = env_u64("TELEGRAM_RETRY_MIN_DELAY_MS") {
            cfg.retry.min_delay_ms = v;
        }
        if let Some(v) = env_u64("TELEGRAM_RETRY_MAX_DELAY_MS") {
            cfg.retry.max_delay_ms = v;
        }
        if let Some(v) = env_u64("TELEGRAM_MEDIA_MAX_BYTES") {
            cfg.media_max_bytes = v;
        }
        if let Some(v) = env_u64("TELEGRAM_HTTP_TIMEOUT_SECS") {
            cfg.http_timeout = Duration::from_secs(v);
        }

        Ok(cfg)
    }

    /// Parse an accounts file (`{ "defaultAccount": "...", "accounts": { ... } }`).
    pub fn from_accounts_json(raw: &str) -> Result<Self> {
        let file: AccountsFile = serde_json::from_str(raw)?;
        let accounts = file
            .accounts
            .into_iter()
            .map(|(id, acc)| (normalize_account_id(&id), acc))
            .collect();
        let default_account = file
            .default_account
            .map(|id| normalize_account_id(&id))
            .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string());

        Ok(Self {
            default_account,
            accounts,
            ..Self::default()
        })
    }

    pub fn resolve_account(&self, account_id: Option<&str>) -> ResolvedAccount {
        let account_id = account_id
            .map(normalize_account_id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.default_account.clone());
        let account = self.accounts.get(&account_id);

        let from_config = account
            .and_then(|a| a.bot_token.clone())
            .and_then(non_empty)
            .map(|t| (t, TokenSource::Config));
        let from_file = || {
            let path = account.and_then(|a| a.token_file.as_ref())?;
            match fs::read_to_string(path) {
                Ok(raw) => non_empty(raw).map(|t| (t, TokenSource::TokenFile)),
                Err(e) => {
                    tracing::warn!(
                        account = %account_id,
                        "cannot read token file {}: {e}",
                        path.display()
                    );
                    None
                }
            }
        };
        let from_env = || {
            (account_id == self.default_account)
                .then(|| self.env_token.clone())
                .flatten()
                .map(|t| (t, TokenSource::Env))
        };

        let (token, token_source) = from_config
            .or_else(from_file)
            .or_else(from_env)
            .unwrap_or((String::new(), TokenSource::None));

        ResolvedAccount {
            retry: account.and_then(|a| a.retry),
            account_id,
            token: token.trim().to_string(),
            token_source,
        }
    }
}

/// An explicit non-blank token wins over the account's.
pub fn resolve_token(explicit: Option<&str>, account: &ResolvedAccount) -> Result<String> {
    if let Some(t) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(t.to_string());
    }
    if account.token.is_empty() {
        return Err(Error::MissingCredential {
            account_id: account.account_id.clone(),
        });
    }
    Ok(account.token.clone())
}

fn normalize_account_id(id: &str) -> String {
    id.trim().to_lowercase()
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accounts_file() {
        let cfg = Config::from_accounts_json(
            r#"{
                "defaultAccount": "Main",
                "accounts": {
                    "MAIN": { "botToken": " 123:abc " },
                    "alerts": { "retry": { "attempts": 5, "minDelayMs": 10 } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.default_account, "main");
        let main = cfg.resolve_account(None);
        assert_eq!(main.account_id, "main");
        assert_eq!(main.token, "123:abc");
        assert_eq!(main.token_source, TokenSource::Config);

        let alerts = cfg.resolve_account(Some(" Alerts "));
        assert_eq!(alerts.token_source, TokenSource::None);
        let retry = alerts.retry.unwrap();
        assert_eq!(retry.attempts, 5);
        assert_eq!(retry.min_delay_ms, 10);
        assert_eq!(retry.max_delay_ms, RetryConfig::default().max_delay_ms);
    }

    #[test]
    fn env_token_only_applies_to_default_account() {
        let cfg = Config {
            env_token: Some("999:env".to_string()),
            ..Config::default()
        };
        let default = cfg.resolve_account(Some(""));
        assert_eq!(default.account_id, "default");
        assert_eq!(default.token, "999:env");
        assert_eq!(default.token_source, TokenSource::Env);

        let other = cfg.resolve_account(Some("ops"));
        assert!(other.token.is_empty());
        assert!(matches!(
            resolve_token(None, &other),
            Err(Error::MissingCredential { account_id }) if account_id == "ops"
        ));
    }

    #[test]
    fn token_file_is_read_per_resolution() {
        let path = std::env::temp_dir().join(format!("tgd-token-{}", std::process::id()));
        fs::write(&path, "111:first\n").unwrap();

        let mut cfg = Config::default();
        cfg.accounts.insert(
            "default".to_string(),
            AccountConfig {
                token_file: Some(path.clone()),
                ..AccountConfig::default()
            },
        );
        let first = cfg.resolve_account(None);
        assert_eq!(first.token, "111:first");
        assert_eq!(first.token_source, TokenSource::TokenFile);

        fs::write(&path, "222:second").unwrap();
        assert_eq!(cfg.resolve_account(None).token, "222:second");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn explicit_token_overrides_account() {
        let cfg = Config::default();
        let account = cfg.resolve_account(None);
        assert_eq!(resolve_token(Some("  42:x "), &account).unwrap(), "42:x");
        assert!(resolve_token(Some("   "), &account).is_err());
    }
}
