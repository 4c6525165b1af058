//! Outcome types produced by the fetch ladder.
//!
//! The ladder stages communicate through tagged records instead of loose
//! tuples: [`FetchStatus`] encodes the status sentinel persisted on the
//! expression, [`PageMeta`] carries the metadata fallback-chain results and
//! [`LadderResult`] is the final composition handed to the processor.

use serde::{Deserialize, Serialize};

use crate::entities::MediaKind;

/// Status sentinel recorded on every fetch attempt.
///
/// Persisted as a three-digit code (`"200"`, `"404"`), `"000"` for a
/// client-side transport failure, or `"ERR"` for an in-process fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    /// Numeric HTTP status returned by the server.
    Code(u16),
    /// DNS/TCP/TLS/timeout failure before any response was read.
    Transport,
    /// Unexpected in-process error while fetching or extracting.
    Error,
}

impl FetchStatus {
    /// Column representation, always 3 characters.
    pub fn as_column(&self) -> String {
        match self {
            FetchStatus::Code(code) => format!("{code:03}"),
            FetchStatus::Transport => "000".to_string(),
            FetchStatus::Error => "ERR".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchStatus::Code(code) if (200..300).contains(code))
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_column())
    }
}

/// Which ladder stage produced the readable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Readability extraction over the directly fetched body.
    Readability,
    /// Structural text fallback over the cleaned DOM.
    Structural,
    /// Readability extraction over an archival snapshot.
    Archive,
}

/// Metadata gathered from any HTML obtained, after the fallback chains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub lang: Option<String>,
}

impl PageMeta {
    /// Overlays `other` on top of `self`: a field is replaced only when the
    /// enriched value is non-empty.
    pub fn enrich(&mut self, other: PageMeta) {
        fn keep(current: &mut Option<String>, candidate: Option<String>) {
            if let Some(value) = candidate {
                if !value.trim().is_empty() {
                    *current = Some(value);
                }
            }
        }
        keep(&mut self.title, other.title);
        keep(&mut self.description, other.description);
        keep(&mut self.keywords, other.keywords);
        keep(&mut self.lang, other.lang);
    }

    /// Fills only the fields still missing or empty.
    pub fn fill_missing(&mut self, other: PageMeta) {
        fn fill(current: &mut Option<String>, candidate: Option<String>) {
            let empty = current.as_deref().map(str::trim).unwrap_or("").is_empty();
            if empty {
                if let Some(value) = candidate {
                    if !value.trim().is_empty() {
                        *current = Some(value);
                    }
                }
            }
        }
        fill(&mut self.title, other.title);
        fill(&mut self.description, other.description);
        fill(&mut self.keywords, other.keywords);
        fill(&mut self.lang, other.lang);
    }

    pub fn is_sparse(&self) -> bool {
        self.title.is_none() || self.description.is_none() || self.keywords.is_none()
    }
}

/// Media reference discovered during extraction, URL already resolved
/// against the expression URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub kind: MediaKind,
}

/// Final outcome of the fetch ladder for one URL.
#[derive(Debug, Clone, Default)]
pub struct LadderResult {
    /// Status observed by the direct fetch; preserved even when a later
    /// stage recovered content from the archive.
    pub status: Option<FetchStatus>,
    /// Raw body of the direct fetch, when it was HTML.
    pub html: Option<String>,
    /// Markdown-like readable text, when any stage accepted one.
    pub readable: Option<String>,
    pub meta: PageMeta,
    pub links: Vec<String>,
    pub media: Vec<MediaRef>,
    pub source: Option<ContentSource>,
}

impl LadderResult {
    pub fn has_content(&self) -> bool {
        self.readable.is_some()
    }

    pub fn status_column(&self) -> String {
        self.status
            .map(|status| status.as_column())
            .unwrap_or_else(|| FetchStatus::Transport.as_column())
    }
}

/// How readable-reprocess output combines with already stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Extractor value wins whenever it is non-empty.
    MercuryPriority,
    /// Stored value wins whenever it is non-empty.
    PreserveExisting,
    /// Field-aware merge: longest wins for title/description, extractor
    /// wins for readable and the rest.
    #[default]
    SmartMerge,
}

impl MergeStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mercury_priority" => Some(MergeStrategy::MercuryPriority),
            "preserve_existing" => Some(MergeStrategy::PreserveExisting),
            "smart_merge" => Some(MergeStrategy::SmartMerge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::MercuryPriority => "mercury_priority",
            MergeStrategy::PreserveExisting => "preserve_existing",
            MergeStrategy::SmartMerge => "smart_merge",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_column_is_three_chars() {
        assert_eq!(FetchStatus::Code(200).as_column(), "200");
        assert_eq!(FetchStatus::Code(7).as_column(), "007");
        assert_eq!(FetchStatus::Transport.as_column(), "000");
        assert_eq!(FetchStatus::Error.as_column(), "ERR");
    }

    #[test]
    fn enrich_ignores_empty_values() {
        let mut meta = PageMeta {
            title: Some("Kept".into()),
            ..PageMeta::default()
        };
        meta.enrich(PageMeta {
            title: Some("  ".into()),
            description: Some("Added".into()),
            ..PageMeta::default()
        });
        assert_eq!(meta.title.as_deref(), Some("Kept"));
        assert_eq!(meta.description.as_deref(), Some("Added"));
    }

    #[test]
    fn fill_missing_never_overwrites() {
        let mut meta = PageMeta {
            title: Some("Original".into()),
            ..PageMeta::default()
        };
        meta.fill_missing(PageMeta {
            title: Some("Other".into()),
            keywords: Some("a,b".into()),
            ..PageMeta::default()
        });
        assert_eq!(meta.title.as_deref(), Some("Original"));
        assert_eq!(meta.keywords.as_deref(), Some("a,b"));
    }

    #[test]
    fn merge_strategy_parses_cli_values() {
        assert_eq!(
            MergeStrategy::parse("smart_merge"),
            Some(MergeStrategy::SmartMerge)
        );
        assert_eq!(
            MergeStrategy::parse("mercury_priority"),
            Some(MergeStrategy::MercuryPriority)
        );
        assert_eq!(MergeStrategy::parse("other"), None);
    }
}
