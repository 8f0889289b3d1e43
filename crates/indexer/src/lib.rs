//! # Snapshot Indexer
//!
//! Periodic whole-tree indexing for directory search and size aggregation.
//!
//! ## Pipeline
//!
//! ```text
//! Root directory
//!     │
//!     ├──> File Scanner (walkdir, unreadable subtrees skipped)
//!     │      └─> FileRecord list
//!     │
//!     ├──> SnapshotStore::publish
//!     │      └─> immutable Snapshot, generation + 1, swapped in one step
//!     │
//!     └──> RebuildScheduler (startup delay, then fixed interval)
//!            └─> IndexUpdate broadcast
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dirview_indexer::SnapshotIndexer;
//!
//! fn main() -> dirview_indexer::Result<()> {
//!     let indexer = SnapshotIndexer::new("/srv/files")?;
//!     let (snapshot, stats) = indexer.rebuild();
//!
//!     println!("generation {}: {} files", snapshot.generation(), stats.files);
//!     Ok(())
//! }
//! ```

mod error;
mod indexer;
mod scanner;
mod scheduler;
mod snapshot;
mod stats;

pub use error::{IndexerError, Result};
pub use indexer::SnapshotIndexer;
pub use scanner::FileScanner;
pub use scheduler::{IndexUpdate, RebuildSchedule, RebuildScheduler, SchedulerHealth};
pub use snapshot::{Snapshot, SnapshotStore};
pub use stats::IndexStats;
