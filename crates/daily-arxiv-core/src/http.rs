use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{HarvestError, Result};

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// `reqwest` client with bounded retries: transport errors back off exponentially,
/// 429 responses wait for `Retry-After`. Other non-success statuses fail immediately.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(max_retries: u32, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            max_retries,
        })
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            let resp = self.client.get(url).send().await;
            match resp {
                Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    if attempt >= self.max_retries {
                        return Err(HarvestError::RateLimit(url.to_string(), wait));
                    }
                    warn!(url, wait_secs = wait, attempt, "rate limited, retrying");
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(HarvestError::Api(
                        url.to_string(),
                        format!("HTTP {status}: {body}"),
                    ));
                }
                Ok(r) => return r.text().await.map_err(HarvestError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(HarvestError::Http(e));
                    }
                    let backoff = backoff_secs(attempt);
                    warn!(url, error = %e, backoff_secs = backoff, "request failed, retrying");
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Exponential backoff for transport failures, capped at 64 seconds.
fn backoff_secs(attempt: u32) -> u64 {
    2u64.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT))
}
