//! Subprocess-driven readability extraction.
//!
//! Drives an external parser binary (`mercury-parser` compatible): one
//! invocation per URL, JSON on stdout, retried with exponential backoff.
//! A missing or failing binary yields `None`, never an error.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};
use weblands_types::{ReadabilityExtractor, ReadableDocument};

const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ParserPayload {
    title: Option<String>,
    content: Option<String>,
    markdown: Option<String>,
    excerpt: Option<String>,
    date_published: Option<String>,
    lang: Option<String>,
}

/// External readability extractor.
pub struct SubprocessReadability {
    command: String,
    max_retries: u32,
}

impl SubprocessReadability {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            max_retries: 3,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        Self {
            max_retries,
            ..self
        }
    }

    async fn run_once(&self, url: &str) -> Option<String> {
        let child = Command::new(&self.command)
            .arg(url)
            .arg("--format=markdown")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match tokio::time::timeout(ATTEMPT_TIMEOUT, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                debug!(command = %self.command, error = %err, "extractor did not start");
                return None;
            }
            Err(_) => {
                debug!(command = %self.command, url, "extractor timed out");
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                command = %self.command,
                url,
                code = output.status.code(),
                "extractor exited with failure"
            );
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ReadabilityExtractor for SubprocessReadability {
    async fn extract(&self, url: &str, _html: Option<&str>) -> Option<ReadableDocument> {
        for attempt in 0..self.max_retries.max(1) {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
            }
            let Some(stdout) = self.run_once(url).await else {
                continue;
            };
            let payload: ParserPayload = match serde_json::from_str(&stdout) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(url, error = %err, "extractor produced unreadable JSON");
                    return None;
                }
            };

            let markdown = payload
                .markdown
                .or(payload.content)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            let document = ReadableDocument {
                title: payload.title.filter(|title| !title.trim().is_empty()),
                markdown,
                content_html: None,
                excerpt: payload.excerpt.filter(|excerpt| !excerpt.trim().is_empty()),
                lang: payload.lang.filter(|lang| !lang.trim().is_empty()),
                published_at: payload.date_published.as_deref().and_then(parse_published),
            };
            if document.is_substantial() {
                return Some(document);
            }
            return None;
        }
        None
    }

    fn name(&self) -> &'static str {
        "subprocess"
    }
}

/// Dates arrive in a handful of shapes; anything else is dropped.
fn parse_published(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
