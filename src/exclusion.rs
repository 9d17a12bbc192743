//! Operator supplied exclusion patterns

use std::path::Path;

use log::warn;

use crate::search::GlobMatcher;
use crate::types::SearchResult;

/// One exclusion rule
#[derive(Debug, Clone)]
enum Rule {
    /// Wildcard pattern tried against the base name, then the full path
    Glob(GlobMatcher),
    /// Lowercased fragment searched for in the full path
    Substring(String),
}

impl Rule {
    fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Glob(glob) => {
                path.file_name().is_some_and(|name| glob.is_match(name)) || glob.is_match(path)
            },
            Self::Substring(fragment) => {
                path.to_string_lossy().to_lowercase().contains(fragment.as_str())
            },
        }
    }
}

/// Ordered set of exclusion patterns
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: Vec<Rule>,
}

impl ExclusionSet {
    /// Build the set from individual patterns
    ///
    /// Patterns are trimmed and empty ones dropped. A pattern containing `*`,
    /// `?` or `[` is a glob; anything else is a case-insensitive substring.
    /// A glob that fails to compile is reported and never matches.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .filter_map(|pattern| {
                let pattern = pattern.as_ref().trim();
                if pattern.is_empty() {
                    return None;
                }
                if pattern.contains(['*', '?', '[']) {
                    match GlobMatcher::new(pattern, false) {
                        Ok(glob) => Some(Rule::Glob(glob)),
                        Err(e) => {
                            warn!("Ignoring exclusion pattern '{pattern}': {e}");
                            None
                        },
                    }
                } else {
                    Some(Rule::Substring(pattern.to_lowercase()))
                }
            })
            .collect();
        Self { rules }
    }

    /// Parse one comma-separated line of patterns
    #[must_use]
    pub fn parse(line: &str) -> Self {
        Self::new(line.split(','))
    }

    /// Whether no usable pattern was given
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any pattern matches `path`
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }

    /// Split results into `(kept, excluded)`, preserving order in both
    #[must_use]
    pub fn partition(&self, results: Vec<SearchResult>) -> (Vec<SearchResult>, Vec<SearchResult>) {
        let (excluded, kept) = results.into_iter().partition(|result| self.matches(&result.path));
        (kept, excluded)
    }
}
