//! # Weblands Crawler
//!
//! The crawl-and-enrich pipeline: batched concurrent fetching, the
//! multi-source extraction ladder with fallbacks, URL normalization and
//! domain attribution, depth-bounded link-graph construction and the
//! relevance scorer driving approval.
//!
//! ## Architecture
//!
//! - [`urls`]: canonicalization, crawlability, domain identity
//! - [`ladder`]: the ordered sequence of extraction attempts for one URL
//! - [`processor`]: applies the ladder to one pending expression
//! - [`scheduler`]: depth-by-depth barrier over windowed batches
//! - [`consolidate`]: re-derives links/media/relevance from stored text
//! - [`readable`]: readable-reprocess pipeline with merge strategies
//! - [`engine`]: top-level land operations behind one long-lived value

pub mod consolidate;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ladder;
pub mod processor;
pub mod readable;
pub mod scheduler;
pub mod urls;

pub use engine::{DeleteOutcome, Engine};
pub use error::Error;
pub use readable::ReadableOptions;
pub use scheduler::{CrawlOptions, CrawlStats};
