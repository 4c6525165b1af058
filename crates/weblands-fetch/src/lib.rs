//! HTTP layer: one shared client bounded by `parallel_connections`, plus
//! the archival mirror client used by the last ladder stages.

mod archive;
mod client;

pub use archive::{ArchiveClient, Snapshot, WAYBACK_AVAILABILITY_ENDPOINT};
pub use client::{FetchError, HttpFetcher, PageResponse};
