//! SQLite persistence for the weblands engine.
//!
//! One [`Store`] handle wraps the connection behind a mutex: processors
//! treat persistence writes as synchronous and atomic per entity, and the
//! store is the only shared mutable resource of a crawl. Multi-row writes
//! (dictionary inserts, link re-creation) run in explicit transactions;
//! unique-constraint races are resolved benignly (`INSERT OR IGNORE`
//! followed by a read).

mod dictionary;
mod domain;
mod error;
mod expression;
mod export;
mod land;
mod link;
mod media;
mod schema;
mod store;

pub use error::StoreError;
pub use expression::PendingFilter;
pub use land::LandSummary;
pub use store::Store;
