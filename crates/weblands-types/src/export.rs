//! Export row shapes handed to the exporter collaborator.
//!
//! The core guarantees these fields are populated from the store; how they
//! are serialized (CSV, GEXF, ZIP corpus) is the exporter's concern.

use serde::{Deserialize, Serialize};

use crate::entities::{Tag, TaggedContent};

/// Export shapes accepted by `land export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    PageCsv,
    FullPageCsv,
    NodeCsv,
    PageGexf,
    NodeGexf,
    MediaCsv,
    Corpus,
}

impl ExportKind {
    pub const ALL: [ExportKind; 7] = [
        ExportKind::PageCsv,
        ExportKind::FullPageCsv,
        ExportKind::NodeCsv,
        ExportKind::PageGexf,
        ExportKind::NodeGexf,
        ExportKind::MediaCsv,
        ExportKind::Corpus,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pagecsv" => Some(ExportKind::PageCsv),
            "fullpagecsv" => Some(ExportKind::FullPageCsv),
            "nodecsv" => Some(ExportKind::NodeCsv),
            "pagegexf" => Some(ExportKind::PageGexf),
            "nodegexf" => Some(ExportKind::NodeGexf),
            "mediacsv" => Some(ExportKind::MediaCsv),
            "corpus" => Some(ExportKind::Corpus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::PageCsv => "pagecsv",
            ExportKind::FullPageCsv => "fullpagecsv",
            ExportKind::NodeCsv => "nodecsv",
            ExportKind::PageGexf => "pagegexf",
            ExportKind::NodeGexf => "nodegexf",
            ExportKind::MediaCsv => "mediacsv",
            ExportKind::Corpus => "corpus",
        }
    }

    /// File extension appended to the export base name.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::PageCsv | ExportKind::FullPageCsv | ExportKind::NodeCsv
            | ExportKind::MediaCsv => "csv",
            ExportKind::PageGexf | ExportKind::NodeGexf => "gexf",
            ExportKind::Corpus => "zip",
        }
    }
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export shapes accepted by `tag export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagExportKind {
    Matrix,
    Content,
}

impl TagExportKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "matrix" => Some(TagExportKind::Matrix),
            "content" => Some(TagExportKind::Content),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagExportKind::Matrix => "matrix",
            TagExportKind::Content => "content",
        }
    }
}

/// One expression row with its domain attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExportRow {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub readable: String,
    pub relevance: i64,
    pub depth: i64,
    pub domain_id: i64,
    pub domain_name: String,
    pub domain_description: String,
    pub domain_keywords: String,
}

/// One domain row aggregated over its expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeExportRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub keywords: String,
    pub expressions: i64,
    pub average_relevance: f64,
}

/// One directed edge of the expression graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkExportRow {
    pub source_id: i64,
    pub target_id: i64,
}

/// One media reference with its owning expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaExportRow {
    pub id: i64,
    pub expression_id: i64,
    pub url: String,
    pub kind: String,
}

/// Everything an exporter may need, assembled in one pass.
#[derive(Debug, Clone, Default)]
pub struct ExportCorpus {
    pub land_name: String,
    pub pages: Vec<PageExportRow>,
    pub nodes: Vec<NodeExportRow>,
    pub links: Vec<LinkExportRow>,
    pub media: Vec<MediaExportRow>,
    pub tags: Vec<Tag>,
    pub tagged_content: Vec<TaggedContent>,
}
