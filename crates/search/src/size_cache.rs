use dirview_indexer::Snapshot;
use dirview_protocol::is_under;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Memoized aggregate size per directory.
///
/// Every entry belongs to the generation of the snapshot it was computed
/// from. The first lookup against a newer snapshot drops the whole table, so
/// sizes from different generations are never mixed.
#[derive(Debug, Default)]
pub struct SizeCache {
    table: RwLock<SizeTable>,
}

#[derive(Debug, Default)]
struct SizeTable {
    generation: u64,
    sizes: HashMap<String, u64>,
}

impl SizeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes of every file in `snapshot` under `dir` (root-relative,
    /// empty for the root).
    pub fn size_of(&self, snapshot: &Snapshot, dir: &str) -> u64 {
        let generation = snapshot.generation();
        {
            let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
            if table.generation == generation {
                if let Some(size) = table.sizes.get(dir) {
                    return *size;
                }
            }
        }

        let size = aggregate_size(snapshot, dir);

        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.generation < generation {
            log::debug!(
                "Size cache reset: generation {} -> {generation} ({} entries dropped)",
                table.generation,
                table.sizes.len()
            );
            table.generation = generation;
            table.sizes.clear();
        }
        // A reader still holding an older snapshot must not pollute the table.
        if table.generation == generation {
            table.sizes.insert(dir.to_string(), size);
        }
        size
    }

    #[must_use]
    pub fn cached_entries(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sizes
            .len()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }
}

fn aggregate_size(snapshot: &Snapshot, dir: &str) -> u64 {
    snapshot
        .records()
        .iter()
        .filter(|record| is_under(dir, &record.path))
        .fold(0u64, |acc, record| acc.saturating_add(record.size))
}
