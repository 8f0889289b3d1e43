use dirview_protocol::FileRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// Immutable point-in-time list of every file under the root.
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    built_at_unix_ms: u64,
    records: Vec<FileRecord>,
}

impl Snapshot {
    /// Generation 0: the placeholder visible before the first rebuild lands.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            generation: 0,
            built_at_unix_ms: 0,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn built_at_unix_ms(&self) -> u64 {
        self.built_at_unix_ms
    }

    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Holder of the globally visible snapshot.
///
/// Single writer (the indexer), many readers. Readers clone the `Arc` and keep
/// a consistent view for as long as they hold it; publishing swaps the
/// reference in one step.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    last_generation: AtomicU64,
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            last_generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot. Never blocks on a running rebuild.
    #[must_use]
    pub fn current(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wrap `records` in a new snapshot with the next generation and make it
    /// current.
    pub fn publish(&self, records: Vec<FileRecord>) -> Arc<Snapshot> {
        let generation = self.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            generation,
            built_at_unix_ms: unix_ms_now(),
            records,
        });

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // An older snapshot never replaces a newer one.
        if slot.generation < generation {
            *slot = snapshot.clone();
        }
        snapshot
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
