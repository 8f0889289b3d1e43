/// Parsed token query.
///
/// Whitespace separates tokens. A token starting with `-` excludes paths that
/// contain the rest of it; every other token must appear in the path. Matching
/// is case-insensitive substring containment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut query = Self::default();
        for token in raw.split_whitespace() {
            let (negative, token) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, token),
            };
            if token.is_empty() {
                continue;
            }
            let token = token.to_lowercase();
            if negative {
                query.exclude.push(token);
            } else {
                query.include.push(token);
            }
        }
        query
    }

    /// True when no token survived parsing; such a query matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    #[must_use]
    pub fn include_tokens(&self) -> &[String] {
        &self.include
    }

    #[must_use]
    pub fn exclude_tokens(&self) -> &[String] {
        &self.exclude
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let haystack = path.to_lowercase();
        self.include.iter().all(|t| haystack.contains(t.as_str()))
            && !self.exclude.iter().any(|t| haystack.contains(t.as_str()))
    }
}
