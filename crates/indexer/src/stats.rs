use serde::{Deserialize, Serialize};

/// Statistics about one rebuild pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of files recorded
    pub files: usize,

    /// Sum of recorded file sizes
    pub total_bytes: u64,

    /// Directories (or entries) the walk could not read
    pub skipped_dirs: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,

    /// Non-fatal errors encountered
    pub errors: Vec<String>,
}

impl IndexStats {
    pub fn new() -> Self {
        Self {
            files: 0,
            total_bytes: 0,
            skipped_dirs: 0,
            time_ms: 0,
            errors: Vec::new(),
        }
    }

    pub fn add_file(&mut self, size: u64) {
        self.files += 1;
        self.total_bytes = self.total_bytes.saturating_add(size);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}

impl Default for IndexStats {
    fn default() -> Self {
        Self::new()
    }
}
