//! Archival mirror lookup and snapshot retrieval.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::client::HttpFetcher;

/// Public availability endpoint queried when every direct stage failed.
pub const WAYBACK_AVAILABILITY_ENDPOINT: &str = "https://archive.org/wayback/available";

/// Closest archived snapshot reported by the availability endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ClosestSnapshot {
    #[serde(default)]
    available: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    status: String,
}

/// Client for the archival mirror; failures never escape, an unavailable
/// archive simply ends the ladder.
pub struct ArchiveClient<'a> {
    fetcher: &'a HttpFetcher,
    endpoint: String,
    lookup_timeout: Duration,
    fetch_timeout: Duration,
}

impl<'a> ArchiveClient<'a> {
    pub fn new(
        fetcher: &'a HttpFetcher,
        lookup_timeout: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            endpoint: WAYBACK_AVAILABILITY_ENDPOINT.to_string(),
            lookup_timeout,
            fetch_timeout,
        }
    }

    /// Points the client at another availability endpoint (tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns the closest available snapshot for `url`, if any.
    pub async fn lookup(&self, url: &str) -> Option<Snapshot> {
        let query = format!("{}?url={}", self.endpoint, url);
        let body = match self.fetcher.fetch_text(&query, self.lookup_timeout).await {
            Ok(body) => body,
            Err(err) => {
                debug!(url, error = %err, "availability lookup failed");
                return None;
            }
        };
        let parsed: AvailabilityResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(url, error = %err, "availability payload unreadable");
                return None;
            }
        };
        let closest = parsed.archived_snapshots.closest?;
        if !closest.available || closest.url.is_empty() {
            return None;
        }
        Some(Snapshot {
            url: closest.url,
            status: closest.status,
        })
    }

    /// Fetches an archived snapshot body.
    pub async fn fetch_snapshot(&self, snapshot_url: &str) -> Option<String> {
        match self
            .fetcher
            .fetch_text(snapshot_url, self.fetch_timeout)
            .await
        {
            Ok(body) => Some(body),
            Err(err) => {
                debug!(snapshot_url, error = %err, "snapshot fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weblands_config::Config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn lookup_parses_closest_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"archived_snapshots":{"closest":{"available":true,
                    "url":"https://web.archive.test/2/abc","status":"200"}}}"#,
            ))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&Config::default()).expect("client");
        let archive = ArchiveClient::new(
            &fetcher,
            Duration::from_secs(10),
            Duration::from_secs(10),
        )
        .with_endpoint(format!("{}/wayback/available", server.uri()));

        let snapshot = archive.lookup("https://a.test/").await.expect("snapshot");
        assert_eq!(snapshot.url, "https://web.archive.test/2/abc");
        assert_eq!(snapshot.status, "200");
    }

    #[tokio::test]
    async fn empty_payload_means_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wayback/available"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"archived_snapshots":{}}"#),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&Config::default()).expect("client");
        let archive = ArchiveClient::new(
            &fetcher,
            Duration::from_secs(10),
            Duration::from_secs(10),
        )
        .with_endpoint(format!("{}/wayback/available", server.uri()));

        assert!(archive.lookup("https://a.test/").await.is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_silent() {
        let fetcher = HttpFetcher::new(&Config::default()).expect("client");
        let archive = ArchiveClient::new(
            &fetcher,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .with_endpoint("http://127.0.0.1:1/wayback/available");

        assert!(archive.lookup("https://a.test/").await.is_none());
    }
}
