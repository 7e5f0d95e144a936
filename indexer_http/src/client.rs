use crate::error::Error;
use crate::pool::{Pool, PoolKind, PoolPair};
use slog::{debug, warn, Logger};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Rate-limited, retrying, fallback-capable HTTP access to the upstream
/// consensus node pair, per spec §4.2.
#[derive(Clone)]
pub struct ReliableRequestClient {
    pools: PoolPair,
    log: Logger,
}

impl ReliableRequestClient {
    pub fn new(pools: PoolPair, log: Logger) -> Self {
        Self { pools, log }
    }

    pub fn pools(&self) -> &PoolPair {
        &self.pools
    }

    /// Runs `call` against `preferred_pool`, retrying up to that pool's
    /// retry budget with exponential backoff, then falling back to the
    /// archive pool if `preferred_pool == Full` and the preferred attempts
    /// are exhausted. `error_handler` is given the final error of the whole
    /// operation and may translate it into a successful value (used to turn
    /// a 404 into `SLOT_MISSED`).
    pub async fn do_call<T, F, Fut, H>(
        &self,
        preferred_pool: PoolKind,
        mut call: F,
        error_handler: Option<H>,
    ) -> Result<T, Error>
    where
        F: FnMut(Url) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
        H: FnOnce(Error) -> Result<T, Error>,
    {
        let preferred = self.pools.get(preferred_pool);
        match self.attempt_pool(preferred, preferred_pool, &mut call).await {
            Ok(value) => Ok(value),
            Err(e) => {
                let final_err = if preferred_pool == PoolKind::Full {
                    let archive = self.pools.get(PoolKind::Archive);
                    warn!(self.log, "full pool exhausted, falling back to archive");
                    match self.attempt_pool(archive, PoolKind::Archive, &mut call).await {
                        Ok(value) => return Ok(value),
                        Err(archive_err) => archive_err,
                    }
                } else {
                    e
                };
                match error_handler {
                    Some(handler) => handler(final_err),
                    None => Err(final_err),
                }
            }
        }
    }

    async fn attempt_pool<T, F, Fut>(&self, pool: &Pool, kind: PoolKind, call: &mut F) -> Result<T, Error>
    where
        F: FnMut(Url) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let _permit = pool.acquire().await;
        let base_url = pool.base_url().full();
        let mut last_err = Error::RequestFailed("no attempts made".to_string());
        for attempt in 0..pool.config.retries.max(1) {
            match call(base_url.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(self.log, "request attempt failed"; "pool" => format!("{kind:?}"), "attempt" => attempt, "error" => format!("{e}"));
                    last_err = e;
                    if attempt + 1 < pool.config.retries {
                        let delay = pool.config.base_delay * 2u32.pow(attempt);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        debug!(self.log, "pool retries exhausted"; "pool" => format!("{kind:?}"));
        Err(last_err)
    }
}

/// Translates a 404 into `SLOT_MISSED`-shaped success, the canonical
/// `error_handler` used for slot/block endpoints (spec §4.2 point 4).
pub fn missed_on_404<T>(missed_value: T) -> impl FnOnce(Error) -> Result<T, Error> {
    move |err: Error| match err {
        Error::UnexpectedStatus(status) if status == reqwest::StatusCode::NOT_FOUND => Ok(missed_value),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolConfig;
    use sensitive_url::SensitiveUrl;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pools() -> PoolPair {
        PoolPair::new(
            PoolConfig {
                base_url: SensitiveUrl::parse("http://archive.example/").unwrap(),
                concurrency: 2,
                retries: 2,
                base_delay: Duration::from_millis(1),
            },
            PoolConfig {
                base_url: SensitiveUrl::parse("http://full.example/").unwrap(),
                concurrency: 2,
                retries: 2,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let client = ReliableRequestClient::new(pools(), logging_null());
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts2 = attempts.clone();
        let result = client
            .do_call(
                PoolKind::Archive,
                move |_url| {
                    let attempts = attempts2.clone();
                    async move {
                        let n = attempts.fetch_add(1, Ordering::SeqCst);
                        if n == 0 {
                            Err(Error::RequestFailed("transient".into()))
                        } else {
                            Ok(42)
                        }
                    }
                },
                None::<fn(Error) -> Result<i32, Error>>,
            )
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn full_falls_back_to_archive_after_exhausting_retries() {
        let client = ReliableRequestClient::new(pools(), logging_null());
        let result = client
            .do_call(
                PoolKind::Full,
                |url: Url| async move {
                    if url.host_str() == Some("full.example") {
                        Err(Error::RequestFailed("full down".into()))
                    } else {
                        Ok(url.host_str().unwrap().to_string())
                    }
                },
                None::<fn(Error) -> Result<String, Error>>,
            )
            .await;
        assert_eq!(result.unwrap(), "archive.example");
    }

    #[tokio::test]
    async fn archive_never_falls_back() {
        let client = ReliableRequestClient::new(pools(), logging_null());
        let result = client
            .do_call(
                PoolKind::Archive,
                |_url: Url| async move { Err::<i32, _>(Error::RequestFailed("archive down".into())) },
                None::<fn(Error) -> Result<i32, Error>>,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn error_handler_translates_404_to_sentinel() {
        let client = ReliableRequestClient::new(pools(), logging_null());
        let result = client
            .do_call(
                PoolKind::Archive,
                |_url: Url| async move { Err::<i32, _>(Error::UnexpectedStatus(reqwest::StatusCode::NOT_FOUND)) },
                Some(missed_on_404(-1)),
            )
            .await;
        assert_eq!(result.unwrap(), -1);
    }

    fn logging_null() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }
}
