use dirview_protocol::{paths::to_relative, FileRecord};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::stats::IndexStats;

/// Walks a root directory and records every regular file beneath it.
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Scan the whole tree.
    ///
    /// Unreadable directories are skipped with a warning and the walk carries
    /// on with their siblings; the scan itself never fails.
    pub fn scan(&self, stats: &mut IndexStats) -> Vec<FileRecord> {
        let mut records = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    let at = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    log::warn!("Skipping unreadable path {at}: {err}");
                    stats.skipped_dirs += 1;
                    stats.add_error(format!("{at}: {err}"));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(path) = to_relative(&self.root, entry.path()) else {
                log::debug!("Entry {} is outside root", entry.path().display());
                continue;
            };
            if path.is_empty() {
                continue;
            }

            let (size, modified_ms) = match entry.metadata() {
                Ok(meta) => (meta.len(), modified_ms(&meta)),
                Err(err) => {
                    log::warn!("Failed to stat {}: {err}", entry.path().display());
                    stats.add_error(format!("{path}: {err}"));
                    continue;
                }
            };

            stats.add_file(size);
            records.push(FileRecord {
                path,
                size,
                modified_ms,
            });
        }

        records
    }
}

pub(crate) fn modified_ms(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
