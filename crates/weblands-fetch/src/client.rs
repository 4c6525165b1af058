//! Shared bounded HTTP client.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;
use weblands_config::Config;

#[derive(Error, Debug)]
pub enum FetchError {
    /// DNS/TCP/TLS/timeout failure before a response was read.
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Response of one page fetch.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    /// Body, captured only for successful HTML responses.
    pub html: Option<String>,
}

/// One shared client for the whole engine.
///
/// The semaphore caps in-flight requests at `parallel_connections`; every
/// fetch path (pages, availability lookups, snapshots, domain probes) goes
/// through it, so batch size and connection budget are the same number.
pub struct HttpFetcher {
    client: Client,
    permits: Semaphore,
    fetch_timeout: Duration,
    default_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(3))
            .timeout(config.fetch_timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            permits: Semaphore::new(config.parallel_connections.max(1)),
            fetch_timeout: config.fetch_timeout,
            default_timeout: config.default_timeout,
        })
    }

    /// Direct page fetch: records the status, captures the body only when
    /// the server answered 200 with an HTML content type.
    pub async fn fetch_page(&self, url: &str) -> Result<PageResponse, FetchError> {
        self.fetch_page_with_timeout(url, self.fetch_timeout).await
    }

    pub async fn fetch_page_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<PageResponse, FetchError> {
        let _permit = self.permits.acquire().await.expect("semaphore closed");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status().as_u16();
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("html"))
            .unwrap_or(false);

        let html = if status == 200 && is_html {
            match response.text().await {
                Ok(body) => Some(body),
                Err(err) => return Err(FetchError::Transport(err)),
            }
        } else {
            debug!(url, status, is_html, "body not captured");
            None
        };

        Ok(PageResponse { status, html })
    }

    /// Fetches a body as text regardless of content type, e.g. an archival
    /// snapshot or a JSON endpoint.
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let _permit = self.permits.acquire().await.expect("semaphore closed");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::Transport)?;
        response.text().await.map_err(FetchError::Transport)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}
