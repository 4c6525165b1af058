//! Capability ports implemented by optional collaborators.
//!
//! The core depends only on these traits; concrete adapters live in the
//! infrastructure crates (in-process readability, subprocess extractor,
//! archival variant) or outside the workspace entirely (byte-level media
//! analyzer, LLM relevance gate, headless browser). Absence of an optional
//! capability must be silent.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entities::MediaKind;
use crate::export::{ExportCorpus, ExportKind, TagExportKind};
use crate::outcome::MediaRef;

/// Structured result of a readability extraction.
#[derive(Debug, Clone, Default)]
pub struct ReadableDocument {
    pub title: Option<String>,
    /// Markdown-like readable text with inline links and images.
    pub markdown: Option<String>,
    /// HTML projection of the main content.
    pub content_html: Option<String>,
    pub excerpt: Option<String>,
    pub lang: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ReadableDocument {
    /// A document is usable when its readable text is long enough to carry
    /// signal; shorter extractions are treated as parse failures.
    pub fn is_substantial(&self) -> bool {
        self.markdown.as_deref().map(str::trim).unwrap_or("").len() > 100
    }
}

/// Main-content extraction capability.
///
/// Implementations: in-process readability over fetched HTML, the
/// subprocess extractor driving an external parser binary, and the
/// archival variant re-running extraction over a mirror snapshot.
#[async_trait]
pub trait ReadabilityExtractor: Send + Sync {
    /// Extract the readable document for `url`, optionally reusing an
    /// already fetched `html` body. Returns `None` when nothing substantial
    /// could be extracted; never errors.
    async fn extract(&self, url: &str, html: Option<&str>) -> Option<ReadableDocument>;

    /// Identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Context handed to the optional LLM relevance gate.
#[derive(Debug, Clone)]
pub struct GateRequest<'a> {
    pub land_name: &'a str,
    pub land_description: &'a str,
    pub terms: &'a [String],
    pub url: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    /// Readable text already truncated to the configured cap.
    pub readable_excerpt: &'a str,
}

/// Opaque yes/no relevance verdict.
///
/// `None` means the gate abstains (disabled, budget exhausted, transport
/// error, unparsable answer); the term-based score then stands.
#[async_trait]
pub trait RelevanceGate: Send + Sync {
    async fn assess(&self, request: GateRequest<'_>) -> Option<bool>;
}

/// Optional headless-browser media discovery, run after approval.
#[async_trait]
pub trait DynamicMediaExtractor: Send + Sync {
    /// Media references rendered into the page at runtime. Failures are
    /// handled inside the implementation; the processor only merges.
    async fn extract_media(&self, url: &str) -> Vec<MediaRef>;
}

/// Byte-level verdict produced by the external media analyzer.
#[derive(Debug, Clone, Default)]
pub struct MediaAnalysis {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub file_size: Option<i64>,
    pub format: Option<String>,
    pub color_mode: Option<String>,
    pub dominant_colors: Option<String>,
    pub has_transparency: Option<bool>,
    pub aspect_ratio: Option<f64>,
    pub exif_data: Option<String>,
    pub image_hash: Option<String>,
    pub error: Option<String>,
}

/// External analyzer consuming media rows produced by the core.
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str, kind: MediaKind) -> MediaAnalysis;
}

/// Failure surfaced by an exporter backend.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("i/o error writing export: {0}")]
    Io(#[from] std::io::Error),
    #[error("exporter for {kind} is not available in this build")]
    Unavailable { kind: String },
}

/// File exporter collaborator.
///
/// The core assembles an [`ExportCorpus`] with every exported field
/// populated and delegates serialization; it makes no guarantee about the
/// produced file formats.
pub trait Exporter: Send + Sync {
    /// Writes the corpus in the requested shape, returning the number of
    /// records written.
    fn export_land(
        &self,
        kind: ExportKind,
        corpus: &ExportCorpus,
        path: &Path,
    ) -> Result<usize, ExportError>;

    /// Writes land tags in the requested shape.
    fn export_tags(
        &self,
        kind: TagExportKind,
        corpus: &ExportCorpus,
        path: &Path,
    ) -> Result<usize, ExportError>;
}
