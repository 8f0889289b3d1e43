use crate::collapse::collapse;
use crate::config::ServiceConfig;
use crate::error::{ListingError, Result};
use dirview_indexer::{RebuildScheduler, Snapshot, SnapshotIndexer};
use dirview_policy::{Caller, EffectivePolicy, PolicyResolver, PolicySummary};
use dirview_protocol::{
    check_segment, is_under, join_relative, normalize_relative, relative_to, to_absolute,
    EntryKind, ListEntry,
};
use dirview_search::{search, SearchQuery, SizeCache};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Result of one `list` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Root-relative directory that was listed.
    pub dir: String,
    pub entries: Vec<ListEntry>,
    pub policy: PolicySummary,
}

/// Ties the indexer, size cache, policy resolver and collapser together for
/// one served root. All per-root state lives here; two services never share
/// caches.
pub struct DirectoryService {
    config: ServiceConfig,
    indexer: Arc<SnapshotIndexer>,
    sizes: SizeCache,
    resolver: PolicyResolver,
}

impl DirectoryService {
    pub fn new(mut config: ServiceConfig) -> Result<Self> {
        config.root = fs::canonicalize(&config.root).map_err(|source| ListingError::ReadDir {
            path: config.root.clone(),
            source,
        })?;

        let indexer = Arc::new(SnapshotIndexer::new(&config.root)?);
        let resolver = PolicyResolver::new(&config.root, config.defaults);

        Ok(Self {
            config,
            indexer,
            sizes: SizeCache::new(),
            resolver,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    #[must_use]
    pub fn indexer(&self) -> &Arc<SnapshotIndexer> {
        &self.indexer
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.indexer.current()
    }

    /// Spawn the periodic rebuild task on the current tokio runtime.
    #[must_use]
    pub fn start_scheduler(&self) -> RebuildScheduler {
        RebuildScheduler::start(Arc::clone(&self.indexer), self.config.schedule)
    }

    /// Effective policy of `dir` for `caller`.
    pub fn resolve(&self, dir: &str, caller: Option<&Caller>) -> Result<EffectivePolicy> {
        Ok(self.resolver.resolve(dir, caller)?)
    }

    /// Aggregate bytes under `dir` according to the current snapshot.
    pub fn size_of(&self, dir: &str) -> Result<u64> {
        let dir = normalize_relative(dir)?;
        Ok(self.sizes.size_of(&self.indexer.current(), &dir))
    }

    /// Collapsed display name of child directory `name` of `dir`. `name` must
    /// be a single entry name.
    pub fn collapse(&self, dir: &str, name: &str) -> Result<String> {
        let dir = normalize_relative(dir)?;
        let name = check_segment(name)?;
        Ok(collapse(
            &to_absolute(&self.config.root, &dir),
            name,
            self.config.collapse_depth,
        ))
    }

    /// List `dir`, or search beneath it when `query` holds any token.
    pub fn list(&self, dir: &str, query: Option<&str>, caller: Option<&Caller>) -> Result<Listing> {
        let dir = normalize_relative(dir)?;
        let abs = to_absolute(&self.config.root, &dir);
        if !abs.is_dir() {
            return Err(ListingError::NotADirectory(dir));
        }

        let policy = self.resolver.resolve(&dir, caller)?;
        let query = query.map(SearchQuery::parse).filter(|q| !q.is_empty());

        let entries = match query {
            Some(query) => self.search_entries(&dir, &query, &policy),
            None => self.read_entries(&dir, &abs, &policy)?,
        };

        Ok(Listing {
            dir,
            entries,
            policy: policy.summary(),
        })
    }

    fn search_entries(
        &self,
        dir: &str,
        query: &SearchQuery,
        policy: &EffectivePolicy,
    ) -> Vec<ListEntry> {
        let snapshot = self.indexer.current();
        search(&snapshot, query)
            .filter(|record| record.path != dir && is_under(dir, &record.path))
            .filter(|record| policy.can_access(record.name()))
            .take(self.config.search_limit)
            .map(|record| ListEntry {
                name: relative_to(dir, &record.path)
                    .unwrap_or(&record.path)
                    .to_string(),
                path: record.path.clone(),
                kind: EntryKind::File,
                size: record.size,
                modified_ms: record.modified_ms,
            })
            .collect()
    }

    fn read_entries(&self, dir: &str, abs: &Path, policy: &EffectivePolicy) -> Result<Vec<ListEntry>> {
        let read_err = |source: io::Error| ListingError::ReadDir {
            path: abs.to_path_buf(),
            source,
        };

        let snapshot = self.indexer.current();
        let mut entries = Vec::new();

        for child in fs::read_dir(abs).map_err(read_err)? {
            let child = match child {
                Ok(child) => child,
                Err(err) => {
                    log::warn!("Skipping unreadable entry in {}: {err}", abs.display());
                    continue;
                }
            };
            let name = child.file_name().to_string_lossy().into_owned();
            if !policy.can_access(&name) {
                continue;
            }
            let Ok(meta) = child.metadata() else {
                log::warn!("Skipping {name}: metadata unavailable");
                continue;
            };
            let modified_ms = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));

            let entry = if meta.is_dir() {
                let display = collapse(abs, &name, self.config.collapse_depth);
                let path = join_relative(dir, &display);
                ListEntry {
                    size: self.sizes.size_of(&snapshot, &path),
                    name: display,
                    path,
                    kind: EntryKind::Dir,
                    modified_ms,
                }
            } else {
                ListEntry {
                    path: join_relative(dir, &name),
                    name,
                    kind: EntryKind::File,
                    size: meta.len(),
                    modified_ms,
                }
            };
            entries.push(entry);
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl std::fmt::Debug for DirectoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryService")
            .field("root", &self.config.root)
            .field("generation", &self.indexer.current().generation())
            .field("cached_sizes", &self.sizes.cached_entries())
            .finish()
    }
}
