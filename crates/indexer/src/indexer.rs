use crate::error::{IndexerError, Result};
use crate::scanner::FileScanner;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::stats::IndexStats;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Builds snapshots of one root and publishes them into a [`SnapshotStore`].
pub struct SnapshotIndexer {
    root: PathBuf,
    store: Arc<SnapshotStore>,
    rebuild_lock: Mutex<()>,
}

impl SnapshotIndexer {
    /// Create an indexer for `root` with a fresh store.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Self::with_store(root, Arc::new(SnapshotStore::new()))
    }

    /// Create an indexer publishing into an existing store.
    pub fn with_store(root: impl AsRef<Path>, store: Arc<SnapshotStore>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IndexerError::InvalidRoot(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            store,
            rebuild_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Current snapshot, shorthand for `store().current()`.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        self.store.current()
    }

    /// Walk the root and publish the result.
    ///
    /// Always publishes: unreadable subtrees are omitted and reported in the
    /// returned stats. Concurrent callers are serialized.
    pub fn rebuild(&self) -> (Arc<Snapshot>, IndexStats) {
        let _guard = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let start = Instant::now();
        log::info!("Started making search index for {}", self.root.display());

        let mut stats = IndexStats::new();
        let records = FileScanner::new(&self.root).scan(&mut stats);
        let snapshot = self.store.publish(records);

        stats.time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Completed search index generation {} in {} ms ({} files, {} bytes, {} skipped)",
            snapshot.generation(),
            stats.time_ms,
            stats.files,
            stats.total_bytes,
            stats.skipped_dirs
        );

        (snapshot, stats)
    }
}
