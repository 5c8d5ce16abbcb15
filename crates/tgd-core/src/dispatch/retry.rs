//! Retry policy and the attempt loop wrapped around every Bot API call.

use std::{future::Future, sync::OnceLock, time::Duration};

use regex::Regex;
use serde::Deserialize;
use tokio::time::{sleep, Instant};

use crate::errors::{TransportError, TransportErrorKind, TransportResult};

/// Retry settings as they appear in config files and CLI overrides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            min_delay_ms: 400,
            max_delay_ms: 30_000,
        }
    }
}

/// Decides how many times a call is attempted and how long to wait in between.
pub trait RetryPolicy: Send + Sync {
    /// Total attempts, including the first one. Values below 1 are treated as 1.
    fn max_attempts(&self) -> u32;

    fn should_retry(&self, err: &TransportError) -> bool;

    /// Delay after the `attempt`-th failure (1-based).
    fn backoff(&self, attempt: u32, err: &TransportError) -> Duration;
}

fn transient_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)429|timeout|connect|reset|closed|unavailable|temporarily")
            .expect("valid regex")
    })
}

/// Exponential backoff for Telegram: honors `retry_after`, retries rate limits and network errors.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    cfg: RetryConfig,
}

impl BackoffPolicy {
    pub fn new(cfg: RetryConfig) -> Self {
        Self { cfg }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy for BackoffPolicy {
    fn max_attempts(&self) -> u32 {
        self.cfg.attempts.max(1)
    }

    fn should_retry(&self, err: &TransportError) -> bool {
        match err.kind {
            TransportErrorKind::RateLimited | TransportErrorKind::Network => true,
            TransportErrorKind::ParseEntities | TransportErrorKind::ChatNotFound => false,
            TransportErrorKind::Api | TransportErrorKind::Other => {
                transient_re().is_match(&err.message)
            }
        }
    }

    fn backoff(&self, attempt: u32, err: &TransportError) -> Duration {
        let min = Duration::from_millis(self.cfg.min_delay_ms);
        let max = Duration::from_millis(self.cfg.max_delay_ms.max(self.cfg.min_delay_ms));
        let base = match err.retry_after {
            Some(d) => d.max(min),
            None => {
                let exp = attempt.saturating_sub(1).min(20);
                min.saturating_mul(1u32 << exp)
            }
        };
        base.min(max)
    }
}

/// Per-call bookkeeping for one logical send.
#[derive(Debug)]
pub struct RetryContext {
    pub attempt: u32,
    pub started: Instant,
}

impl RetryContext {
    fn new() -> Self {
        Self {
            attempt: 0,
            started: Instant::now(),
        }
    }
}

/// Runs a transport call until it succeeds or the policy gives up.
pub struct RetryRunner<'a> {
    policy: &'a dyn RetryPolicy,
    verbose: bool,
}

impl<'a> RetryRunner<'a> {
    pub fn new(policy: &'a dyn RetryPolicy, verbose: bool) -> Self {
        Self { policy, verbose }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Returns the first success, or the last error once attempts are exhausted.
    pub async fn attempt<T, F, Fut>(&self, label: &str, mut op: F) -> TransportResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let max = self.policy.max_attempts().max(1);
        let mut ctx = RetryContext::new();

        loop {
            ctx.attempt += 1;
            let err = match op().await {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };

            if ctx.attempt >= max || !self.policy.should_retry(&err) {
                return Err(err);
            }

            let delay = self.policy.backoff(ctx.attempt, &err);
            if self.verbose {
                tracing::warn!(
                    label,
                    attempt = ctx.attempt,
                    max_attempts = max,
                    elapsed_ms = ctx.started.elapsed().as_millis() as u64,
                    delay_ms = delay.as_millis() as u64,
                    "telegram {label} failed, retrying: {err}"
                );
            } else {
                tracing::debug!(label, attempt = ctx.attempt, "retrying after: {err}");
            }
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn instant(attempts: u32) -> BackoffPolicy {
        BackoffPolicy::new(RetryConfig {
            attempts,
            min_delay_ms: 0,
            max_delay_ms: 0,
        })
    }

    #[tokio::test]
    async fn stops_after_max_attempts_with_last_error() {
        let policy = instant(3);
        let runner = RetryRunner::new(&policy, false);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let res: TransportResult<()> = runner
            .attempt("message", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(TransportError::new(
                    TransportErrorKind::Network,
                    format!("connection reset #{n}"),
                ))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(res.unwrap_err().message, "connection reset #3");
    }

    #[tokio::test]
    async fn returns_first_success() {
        let policy = instant(5);
        let runner = RetryRunner::new(&policy, true);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let res = runner
            .attempt("photo", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 2 {
                    Err(TransportError::new(TransportErrorKind::RateLimited, "429"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(res.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_fail_immediately() {
        let policy = instant(3);
        let runner = RetryRunner::new(&policy, false);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let res: TransportResult<()> = runner
            .attempt("message", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::new(
                    TransportErrorKind::ChatNotFound,
                    "400: Bad Request: chat not found",
                ))
            })
            .await;

        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let policy = instant(0);
        let runner = RetryRunner::new(&policy, false);
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: TransportResult<()> = runner
            .attempt("message", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::new(TransportErrorKind::Network, "timeout"))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = BackoffPolicy::new(RetryConfig {
            attempts: 10,
            min_delay_ms: 400,
            max_delay_ms: 1_000,
        });
        let e = TransportError::new(TransportErrorKind::Network, "reset");
        assert_eq!(p.backoff(1, &e), Duration::from_millis(400));
        assert_eq!(p.backoff(2, &e), Duration::from_millis(800));
        assert_eq!(p.backoff(3, &e), Duration::from_millis(1_000));

        let limited = TransportError::new(TransportErrorKind::RateLimited, "429")
            .with_retry_after(Duration::from_millis(700));
        assert_eq!(p.backoff(1, &limited), Duration::from_millis(700));
        let long = limited.with_retry_after(Duration::from_secs(60));
        assert_eq!(p.backoff(1, &long), Duration::from_millis(1_000));
    }

    #[test]
    fn retryable_predicate() {
        let p = BackoffPolicy::default();
        assert!(p.should_retry(&TransportError::new(TransportErrorKind::Network, "x")));
        assert!(p.should_retry(&TransportError::new(
            TransportErrorKind::Api,
            "503 Service Unavailable"
        )));
        assert!(p.should_retry(&TransportError::new(
            TransportErrorKind::Other,
            "request timeout"
        )));
        assert!(!p.should_retry(&TransportError::new(
            TransportErrorKind::Api,
            "400: Bad Request: message is too long"
        )));
        assert!(!p.should_retry(&TransportError::new(
            TransportErrorKind::ParseEntities,
            "can't parse entities"
        )));
    }
}
