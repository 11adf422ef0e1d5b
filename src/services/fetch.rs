// src/services/fetch.rs

//! HTTP client construction and the retrying downloader.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use rand::Rng;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, SyncConfig};

/// Create the configured HTTP client shared by a run.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Bounded exponential backoff settings for resource downloads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Base delay before the first retry
    pub initial: Duration,

    /// Total attempts allowed, the first one included
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(sync: &SyncConfig) -> Self {
        Self {
            initial: Duration::from_secs(sync.backoff_initial_secs),
            max_attempts: sync.max_fetch_attempts,
        }
    }
}

/// Whether a request error is worth retrying.
///
/// Covers timeouts, connection failures, and bodies cut off mid-read.
/// Anything else (bad URL, HTTP error status) aborts the resource.
pub fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_body() || error.is_decode()
}

/// Delay before the `retry`-th retry (zero-based): `initial * 2^retry`
/// plus a uniform jitter from `[0, base/2)` so concurrently failing
/// downloads don't retry in lockstep.
pub fn backoff_delay(initial: Duration, retry: u32) -> Duration {
    let base_ms = initial.as_millis() as u64 * (1u64 << retry.min(16));
    let half = base_ms / 2;
    let jitter = if half > 0 {
        rand::thread_rng().gen_range(0..half)
    } else {
        0
    };
    Duration::from_millis(base_ms + jitter)
}

/// Download `url` into memory. Single attempt; the update pass aborts a
/// resource on failure instead of retrying.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Stream `url` to `dest`, creating parent directories. The body is
/// written to a temporary sibling and renamed into place only after the
/// stream completes, so a connection dropped mid-body never leaves a
/// truncated file at `dest`.
pub async fn fetch_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await?.error_for_status()?;

    let tmp = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                file.write_all(&bytes).await?;
                written += bytes.len() as u64;
            }
            Err(error) => {
                drop(file);
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(AppError::Http(error));
            }
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&tmp, dest).await?;
    Ok(written)
}

/// Download `url` to `dest` with bounded retries on transient failure.
pub async fn fetch_with_backoff(
    client: &Client,
    url: &str,
    dest: &Path,
    policy: RetryPolicy,
) -> Result<u64> {
    let mut attempt = 0u32;
    loop {
        match fetch_to_file(client, url, dest).await {
            Ok(written) => return Ok(written),
            Err(AppError::Http(error)) if is_transient(&error) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(AppError::fetch(
                        url,
                        format!("gave up after {attempt} attempts: {error}"),
                    ));
                }
                let delay = backoff_delay(policy.initial, attempt - 1);
                log::warn!(
                    "Transient failure fetching {url} (attempt {attempt}): {error}. Retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_jitters_within_half_base() {
        let initial = Duration::from_millis(40);
        for retry in 0..4u32 {
            let base = 40u128 << retry;
            for _ in 0..50 {
                let delay = backoff_delay(initial, retry).as_millis();
                assert!(delay >= base, "delay {delay} below base {base}");
                assert!(delay < base + base / 2, "delay {delay} past jitter bound");
            }
        }
    }

    #[test]
    fn backoff_without_jitter_room_is_exact() {
        let delay = backoff_delay(Duration::from_millis(1), 0);
        assert_eq!(delay, Duration::from_millis(1));
    }

    #[test]
    fn policy_comes_from_sync_config() {
        let policy = RetryPolicy::from_config(&SyncConfig::default());
        assert_eq!(policy.initial, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 5);
    }
}
