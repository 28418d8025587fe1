//! Shared HTTP client for the block explorer and NFT index, with request
//! pacing and a request counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Minimum spacing between request starts. 0 disables pacing.
    pub min_interval_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_interval_ms: 0,
        }
    }
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api error: status {0} body {1}")]
    Api(u16, String),
}

impl HttpError {
    /// HTTP status of a non-success response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Api(status, _) => Some(*status),
            HttpError::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Thin wrapper over `reqwest::Client`. Returns raw response bodies; callers parse.
pub struct HttpClient {
    config: HttpConfig,
    client: reqwest::Client,
    last_request: Mutex<Option<Instant>>,
    request_count: AtomicU64,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            client,
            last_request: Mutex::new(None),
            request_count: AtomicU64::new(0),
        })
    }

    async fn rate_limit(&self) {
        if self.config.min_interval_ms == 0 {
            return;
        }
        let interval = Duration::from_millis(self.config.min_interval_ms);
        // Held across the sleep so concurrent callers queue for successive slots.
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        self.rate_limit().await;
        let res = self.client.get(url).send().await?;
        self.finish(res).await
    }

    async fn finish(&self, res: reqwest::Response) -> Result<String, HttpError> {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success response");
            return Err(HttpError::Api(status.as_u16(), body));
        }
        Ok(body)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(elapsed >= expected && elapsed <= expected + Duration::from_millis(10));
    }

    #[test]
    fn api_error_exposes_status() {
        let e = HttpError::Api(429, "slow down".into());
        assert_eq!(e.status(), Some(429));
        assert!(e.to_string().contains("429"));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_spaces_consecutive_slots() {
        let http = HttpClient::new(HttpConfig {
            min_interval_ms: 250,
            ..Default::default()
        })
        .unwrap();
        let start = Instant::now();
        http.rate_limit().await;
        http.rate_limit().await;
        http.rate_limit().await;
        assert_elapsed(start, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_disabled_by_default() {
        let http = HttpClient::new(HttpConfig::default()).unwrap();
        let start = Instant::now();
        http.rate_limit().await;
        http.rate_limit().await;
        assert_elapsed(start, Duration::ZERO);
        assert_eq!(http.request_count(), 0);
    }
}
