use crate::config::VisibilityRule;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Compiled-pattern cache owned by one resolver.
///
/// Invalid patterns are remembered as `None` so they are reported once and
/// skipped afterwards.
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: RwLock<HashMap<String, Option<Arc<Regex>>>>,
}

impl RegexCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pattern: &str) -> Option<Arc<Regex>> {
        if let Some(hit) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return hit.clone();
        }

        let mut compiled = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        compiled
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(re) => Some(Arc::new(re)),
                Err(err) => {
                    log::warn!("Skipping invalid visibility pattern {pattern:?}: {err}");
                    None
                }
            })
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledRule {
    pub regex: String,
    pub allow: bool,
    #[serde(skip)]
    matcher: Arc<Regex>,
}

impl PartialEq for CompiledRule {
    fn eq(&self, other: &Self) -> bool {
        self.regex == other.regex && self.allow == other.allow
    }
}

impl Eq for CompiledRule {}

/// Ordered visibility rules; first match wins, no match allows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisibilityRules {
    rules: Vec<CompiledRule>,
}

impl VisibilityRules {
    /// Compile `rules` in order, dropping patterns that fail to compile.
    pub fn compile<'a>(
        rules: impl IntoIterator<Item = &'a VisibilityRule>,
        cache: &RegexCache,
    ) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                cache.get(&rule.regex).map(|matcher| CompiledRule {
                    regex: rule.regex.clone(),
                    allow: rule.allow,
                    matcher,
                })
            })
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.matcher.is_match(name))
            .map_or(true, |rule| rule.allow)
    }

    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(regex: &str, allow: bool) -> VisibilityRule {
        VisibilityRule {
            regex: regex.to_string(),
            allow,
        }
    }

    #[test]
    fn unmatched_names_are_allowed() {
        let cache = RegexCache::new();
        let rules = VisibilityRules::compile(&[rule(r".*\.secret$", false)], &cache);
        assert!(!rules.allows("x.secret"));
        assert!(rules.allows("x.txt"));
    }

    #[test]
    fn first_match_wins() {
        let cache = RegexCache::new();
        let rules = VisibilityRules::compile(
            &[rule(r"^keep\.", true), rule(r"\.log$", false)],
            &cache,
        );
        assert!(rules.allows("keep.log"));
        assert!(!rules.allows("other.log"));
    }

    #[test]
    fn invalid_pattern_is_skipped_and_cached() {
        let cache = RegexCache::new();
        let rules =
            VisibilityRules::compile(&[rule("([unclosed", false), rule("^b", false)], &cache);
        assert_eq!(rules.len(), 1);
        assert!(rules.allows("([unclosed"));
        assert!(!rules.allows("bad"));
        assert!(cache.get("([unclosed").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn caches_are_independent() {
        let a = RegexCache::new();
        let b = RegexCache::new();
        a.get("^x");
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
