use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{0}' escapes the served root")]
    EscapesRoot(String),

    #[error("path contains a NUL byte")]
    NulByte,

    #[error("'{0}' is not a single path segment")]
    NotASegment(String),
}

/// Canonicalize a caller-supplied path into root-relative form.
///
/// Accepts either separator, leading slashes and `.` segments. `..` is
/// resolved lexically; climbing above the root is rejected. The root itself
/// normalizes to the empty string.
pub fn normalize_relative(raw: &str) -> Result<String, PathError> {
    if raw.contains('\0') {
        return Err(PathError::NulByte);
    }

    let raw = raw.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathError::EscapesRoot(raw.clone()));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Accept `name` only when it names one plain child entry: no separators,
/// not `.` or `..`, not empty.
pub fn check_segment(name: &str) -> Result<&str, PathError> {
    if name.contains('\0') {
        return Err(PathError::NulByte);
    }
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(PathError::NotASegment(name.to_string()));
    }
    Ok(name)
}

/// Segment-aware prefix check: `foo` covers `foo` and `foo/x`, not `foobar/x`.
/// The empty prefix (root) covers everything.
#[must_use]
pub fn is_under(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() || path == prefix {
        return true;
    }

    if !path.starts_with(prefix) {
        return false;
    }

    path.as_bytes().get(prefix.len()) == Some(&b'/')
}

/// Join two root-relative fragments without producing a leading slash.
#[must_use]
pub fn join_relative(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Strip `base` from `path` when `path` lies under it.
#[must_use]
pub fn relative_to<'a>(base: &str, path: &'a str) -> Option<&'a str> {
    if !is_under(base, path) {
        return None;
    }
    if base.is_empty() {
        return Some(path);
    }
    Some(path[base.len()..].trim_start_matches('/'))
}

/// Convert a path found under `root` into its forward-slash relative form.
pub fn to_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut out = String::new();
    for component in relative.components() {
        if let std::path::Component::Normal(name) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&name.to_string_lossy());
        }
    }
    Some(out)
}

/// Map a normalized relative path back onto the filesystem.
#[must_use]
pub fn to_absolute(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}
