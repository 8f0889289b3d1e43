use crate::config::{load_override, AccessOverride, UserRule, VisibilityRule};
use crate::error::Result;
use crate::visibility::{RegexCache, VisibilityRules};
use dirview_protocol::{normalize_relative, to_absolute};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Server-wide permissions used when no directory declares otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyDefaults {
    pub upload: bool,
    pub delete: bool,
}

/// Already-authenticated identity of the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Email(String),
    Token(String),
}

impl UserRule {
    /// A rule matches on a non-empty email or token equal to the caller's.
    #[must_use]
    pub fn matches(&self, caller: &Caller) -> bool {
        let (declared, presented) = match caller {
            Caller::Email(email) => (self.email.as_deref(), email.as_str()),
            Caller::Token(token) => (self.token.as_deref(), token.as_str()),
        };
        matches!(declared, Some(value) if !value.is_empty() && value == presented)
    }
}

/// Running result of folding override files from the root downwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedPolicy {
    pub upload: bool,
    pub delete: bool,
    pub users: Vec<UserRule>,
    pub visibility: Vec<VisibilityRule>,
}

impl FoldedPolicy {
    #[must_use]
    pub fn seed(defaults: PolicyDefaults) -> Self {
        Self {
            upload: defaults.upload,
            delete: defaults.delete,
            users: Vec::new(),
            visibility: Vec::new(),
        }
    }

    /// Apply one directory's override: declared scalars replace, rule lists
    /// append after the ones inherited from shallower directories.
    pub fn fold(&mut self, layer: AccessOverride) {
        if let Some(upload) = layer.upload {
            self.upload = upload;
        }
        if let Some(delete) = layer.delete {
            self.delete = delete;
        }
        self.users.extend(layer.users);
        self.visibility.extend(layer.access_tables);
    }

    /// First user rule (root-most first) matching `caller`.
    #[must_use]
    pub fn rule_for(&self, caller: &Caller) -> Option<&UserRule> {
        self.users.iter().find(|rule| rule.matches(caller))
    }
}

/// Fully resolved policy for one directory and one (optional) caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectivePolicy {
    pub upload: bool,
    pub delete: bool,
    pub visibility: VisibilityRules,
}

impl EffectivePolicy {
    /// Whether an entry called `name` may be shown.
    #[must_use]
    pub fn can_access(&self, name: &str) -> bool {
        self.visibility.allows(name)
    }

    #[must_use]
    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            upload: self.upload,
            delete: self.delete,
        }
    }
}

/// The caller-facing part of [`EffectivePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicySummary {
    pub upload: bool,
    pub delete: bool,
}

/// Resolves effective policies by reading override files along the ancestor
/// chain on every call. Holds no per-request state.
#[derive(Debug)]
pub struct PolicyResolver {
    root: PathBuf,
    defaults: PolicyDefaults,
    regexes: RegexCache,
}

impl PolicyResolver {
    pub fn new(root: impl AsRef<Path>, defaults: PolicyDefaults) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            defaults,
            regexes: RegexCache::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn defaults(&self) -> PolicyDefaults {
        self.defaults
    }

    /// Resolve the policy of `dir` (root-relative) for `caller`.
    ///
    /// Only a path escaping the root is an error. Unreadable or malformed
    /// override files are logged and treated as absent.
    pub fn resolve(&self, dir: &str, caller: Option<&Caller>) -> Result<EffectivePolicy> {
        let mut dir = normalize_relative(dir)?;
        if to_absolute(&self.root, &dir).is_file() {
            dir = parent_of(&dir).to_string();
        }

        let folded = self.fold_chain(&dir);
        Ok(self.finish(&folded, caller))
    }

    /// Fold every override file from the root down to `dir` inclusive.
    #[must_use]
    pub fn fold_chain(&self, dir: &str) -> FoldedPolicy {
        let mut folded = FoldedPolicy::seed(self.defaults);
        for ancestor in ancestor_chain(dir) {
            let abs = to_absolute(&self.root, &ancestor);
            match load_override(&abs) {
                Ok(Some(layer)) => folded.fold(layer),
                Ok(None) => {}
                Err(err) => log::warn!("Ignoring override for '{ancestor}': {err}"),
            }
        }
        folded
    }

    fn finish(&self, folded: &FoldedPolicy, caller: Option<&Caller>) -> EffectivePolicy {
        let (upload, delete) = match caller.and_then(|c| folded.rule_for(c)) {
            Some(rule) => (rule.upload, rule.delete),
            None => (folded.upload, folded.delete),
        };

        EffectivePolicy {
            upload,
            delete,
            visibility: VisibilityRules::compile(&folded.visibility, &self.regexes),
        }
    }
}

/// `""`, `"a"`, `"a/b"` for `"a/b"`; just `""` for the root.
fn ancestor_chain(dir: &str) -> Vec<String> {
    let mut chain = vec![String::new()];
    if dir.is_empty() {
        return chain;
    }
    let mut current = String::new();
    for segment in dir.split('/') {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        chain.push(current.clone());
    }
    chain
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}
