//! Snapshot consumers: token search and per-directory size aggregation.

mod engine;
mod query;
mod size_cache;

pub use engine::{search, SearchHits};
pub use query::SearchQuery;
pub use size_cache::SizeCache;
