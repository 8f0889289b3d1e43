//! Per-directory override file.
//!
//! ```toml
//! upload = true
//! delete = false
//!
//! [[users]]
//! email = "ops@example.com"
//! upload = true
//! delete = true
//!
//! [[users]]
//! token = "ci-4f1d"
//! upload = true
//!
//! [[accessTables]]
//! regex = '\.secret$'
//! allow = false
//! ```

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reserved file name recognized in every directory.
pub const OVERRIDE_FILE_NAME: &str = ".dirview.toml";

/// What one directory's override file declares. Absent fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessOverride {
    pub upload: Option<bool>,
    pub delete: Option<bool>,
    pub users: Vec<UserRule>,
    #[serde(rename = "accessTables", alias = "access_tables")]
    pub access_tables: Vec<VisibilityRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRule {
    pub email: Option<String>,
    pub token: Option<String>,
    pub upload: bool,
    pub delete: bool,
}

/// Name-based visibility rule. `regex` is matched against the entry name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityRule {
    pub regex: String,
    pub allow: bool,
}

impl AccessOverride {
    pub fn parse(raw: &str, origin: &Path) -> Result<Self> {
        toml::from_str(raw).map_err(|source| PolicyError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Read the override file of `dir`. A missing file is `Ok(None)`.
pub fn load_override(dir: &Path) -> Result<Option<AccessOverride>> {
    let path = dir.join(OVERRIDE_FILE_NAME);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(PolicyError::Read { path, source }),
    };
    AccessOverride::parse(&raw, &path).map(Some)
}
