//! # Weblands Types
//!
//! Shared type definitions for the weblands web-intelligence engine.
//! This crate is the dependency leaf: entities persisted by the store,
//! the outcome types produced by the fetch ladder, and the capability
//! ports optional collaborators implement.

pub mod entities;
pub mod export;
pub mod outcome;
pub mod ports;

pub use entities::{
    Domain, Expression, ExpressionLink, Land, Media, MediaKind, Tag, TaggedContent, Word,
};
pub use export::{ExportCorpus, ExportKind, LinkExportRow, MediaExportRow, NodeExportRow, PageExportRow, TagExportKind};
pub use outcome::{ContentSource, FetchStatus, LadderResult, MediaRef, MergeStrategy, PageMeta};
pub use ports::{
    DynamicMediaExtractor, ExportError, Exporter, GateRequest, MediaAnalysis, MediaAnalyzer,
    ReadabilityExtractor, ReadableDocument, RelevanceGate,
};
