//! Common types and constants for `delf`

use std::fmt;
use std::path::{Path, PathBuf};

/// Default number of matches rendered while searching
pub const DEFAULT_MAX_DISPLAY: usize = 100;

/// Number of entries shown in the deletion preview
pub const PREVIEW_LIMIT: usize = 10;

/// Phrase an elevated operator must type to delete critical paths
pub const CRITICAL_CONFIRMATION: &str = "YES DELETE SYSTEM FILES";

/// Safety tier of a matched path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Nothing in the safety lists covers the path
    Safe,
    /// Covered by a warning prefix (home roots, temp directories)
    Warning,
    /// Covered by a critical prefix (operating system directories)
    Critical,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => f.write_str("safe"),
            Self::Warning => f.write_str("warning"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// Which kind of entry a search should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    /// Files and directories
    #[default]
    Any,
    /// Regular files (and anything else that is not a directory)
    File,
    /// Directories only
    Dir,
}

impl TypeFilter {
    /// Whether an entry of the given kind passes the filter
    #[must_use]
    pub const fn accepts(self, is_dir: bool) -> bool {
        match self {
            Self::Any => true,
            Self::File => !is_dir,
            Self::Dir => is_dir,
        }
    }
}

/// A matched path together with its safety tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Path as produced by the searcher
    pub path:     PathBuf,
    /// Safety tier assigned at match time
    pub category: Category,
    /// Whether the path was a directory when it was matched
    pub is_dir:   bool,
}

impl SearchResult {
    /// Create a new result
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, category: Category, is_dir: bool) -> Self {
        Self { path: path.into(), category, is_dir }
    }

    /// Path of the result
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Number of results per safety tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    /// Critical results
    pub critical: usize,
    /// Warning results
    pub warning:  usize,
    /// Safe results
    pub safe:     usize,
}

impl CategoryCounts {
    /// Count the results in each tier
    #[must_use]
    pub fn of(results: &[SearchResult]) -> Self {
        results.iter().fold(Self::default(), |mut counts, result| {
            match result.category {
                Category::Critical => counts.critical += 1,
                Category::Warning => counts.warning += 1,
                Category::Safe => counts.safe += 1,
            }
            counts
        })
    }

    /// Total number of results counted
    #[must_use]
    pub const fn total(&self) -> usize {
        self.critical + self.warning + self.safe
    }
}

const _: () = {
    assert!(DEFAULT_MAX_DISPLAY > 0);
    assert!(PREVIEW_LIMIT > 0);
    assert!(!CRITICAL_CONFIRMATION.is_empty());
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_filter() {
        assert!(TypeFilter::Any.accepts(true));
        assert!(TypeFilter::Any.accepts(false));
        assert!(TypeFilter::File.accepts(false));
        assert!(!TypeFilter::File.accepts(true));
        assert!(TypeFilter::Dir.accepts(true));
        assert!(!TypeFilter::Dir.accepts(false));
    }

    #[test]
    fn test_category_counts() {
        let results = vec![
            SearchResult::new("/a", Category::Safe, false),
            SearchResult::new("/b", Category::Critical, true),
            SearchResult::new("/c", Category::Warning, false),
            SearchResult::new("/d", Category::Safe, false),
        ];
        let counts = CategoryCounts::of(&results);
        assert_eq!(counts, CategoryCounts { critical: 1, warning: 1, safe: 2 });
        assert_eq!(counts.total(), results.len());
    }
}
