use dirview_indexer::RebuildSchedule;
use dirview_policy::PolicyDefaults;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COLLAPSE_DEPTH: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

const MAX_COLLAPSE_DEPTH: usize = 64;
const MAX_SEARCH_LIMIT: usize = 10_000;

/// Everything the listing service needs to know about the served tree.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Served root; every path handled by the service is relative to it.
    pub root: PathBuf,
    /// Permissions applied where no override file says otherwise.
    pub defaults: PolicyDefaults,
    /// Maximum hops when collapsing single-child directory chains.
    pub collapse_depth: usize,
    /// Maximum entries returned for a search listing.
    pub search_limit: usize,
    pub schedule: RebuildSchedule,
}

impl ServiceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            defaults: PolicyDefaults::default(),
            collapse_depth: DEFAULT_COLLAPSE_DEPTH,
            search_limit: DEFAULT_SEARCH_LIMIT,
            schedule: RebuildSchedule::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: PolicyDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Apply `DIRVIEW_*` environment overrides. Invalid values keep the
    /// current setting.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secs) = parse_u64(lookup("DIRVIEW_REBUILD_INTERVAL_SECS").as_deref()) {
            self.schedule.interval = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = parse_u64(lookup("DIRVIEW_STARTUP_DELAY_MS").as_deref()) {
            self.schedule.startup_delay = Duration::from_millis(ms);
        }
        if let Some(depth) = parse_u64(lookup("DIRVIEW_COLLAPSE_DEPTH").as_deref()) {
            self.collapse_depth = clamp_usize(depth, 0, MAX_COLLAPSE_DEPTH);
        }
        if let Some(limit) = parse_u64(lookup("DIRVIEW_SEARCH_LIMIT").as_deref()) {
            self.search_limit = clamp_usize(limit, 1, MAX_SEARCH_LIMIT);
        }
        self
    }
}

fn parse_u64(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
}

fn clamp_usize(value: u64, min: usize, max: usize) -> usize {
    usize::try_from(value).unwrap_or(max).clamp(min, max)
}
