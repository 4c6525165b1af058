//! Persisted entities of the weblands data model.
//!
//! A `Land` is a user-defined project owning a dictionary and a corpus of
//! `Expression`s (one per crawled or pending URL). `Domain` rows group
//! expressions by canonical host identity and are shared across lands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A research project scoping a dictionary and a corpus of expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Land {
    pub id: i64,
    /// Unique human-chosen name.
    pub name: String,
    pub description: String,
    /// Language codes accepted by the relevance gate, e.g. `["fr"]`.
    pub lang: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Land {
    /// Comma-joined language list as persisted.
    pub fn lang_column(&self) -> String {
        self.lang.join(",")
    }

    /// Splits a persisted language column back into codes.
    pub fn parse_lang(column: &str) -> Vec<String> {
        column
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Canonical host identity, shared across lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: i64,
    /// Canonical name as produced by the URL canonicalizer.
    pub name: String,
    pub http_status: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub created_at: DateTime<Utc>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// One crawled or pending URL within a land.
///
/// Unique per `(land_id, url)`; the URL is stored in canonical form with
/// the fragment removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub id: i64,
    pub land_id: i64,
    pub url: String,
    pub domain_id: i64,
    /// Three-digit HTTP code, `"000"` for transport failure or `"ERR"` for
    /// an in-process fault. `None` until the first fetch attempt.
    pub http_status: Option<String>,
    pub lang: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub readable: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub readable_at: Option<DateTime<Utc>>,
    /// Weighted lemma-occurrence score; zero means "not approved".
    pub relevance: Option<i64>,
    /// Graph distance from a seed URL; 0 for seeds.
    pub depth: i64,
}

impl Expression {
    /// Whether the last processing pass approved this expression.
    pub fn is_approved(&self) -> bool {
        self.relevance.unwrap_or(0) > 0
    }
}

/// Directed edge between two expressions of the same land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpressionLink {
    pub source_id: i64,
    pub target_id: i64,
}

/// Dictionary term together with its stemmed lemma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub term: String,
    pub lemma: String,
}

/// Kind of an embedded media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Img,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Img => "img",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "img" => Some(MediaKind::Img),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedded media reference extracted from an expression.
///
/// The analyzer columns are written by the external byte-level analyzer
/// through the [`crate::ports::MediaAnalyzer`] port; the core only creates
/// rows with `url` and `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub expression_id: i64,
    pub url: String,
    pub kind: MediaKind,
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
    pub analyzed_at: Option<DateTime<Utc>>,
    pub analysis_error: Option<String>,
}

/// Land-scoped hierarchical label; written by external tagging tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub land_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub sorting: i64,
    pub color: Option<String>,
}

/// A tagged span of an expression's readable text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedContent {
    pub id: i64,
    pub tag_id: i64,
    pub expression_id: i64,
    pub text: String,
    pub from_char: i64,
    pub to_char: i64,
}
