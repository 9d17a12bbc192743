//! Resolved configuration for one invocation

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::filters::{AgeFilter, SizeFilter};
use crate::types::{DEFAULT_MAX_DISPLAY, TypeFilter};

/// Environment variable that disables the delegated `fd` search
pub const NO_FD_ENV: &str = "DELF_NO_FD";

/// Everything a run needs to know, fixed before the search starts
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Glob matched against entry names, may be empty in empty-dirs mode
    pub pattern:      String,
    /// Directory to search
    pub root:         PathBuf,
    /// Stop after the preview
    pub dry_run:      bool,
    /// Skip exclusions and confirmations
    pub force:        bool,
    /// Match the pattern case-insensitively
    pub ignore_case:  bool,
    /// Restrict matches to files or directories
    pub type_filter:  TypeFilter,
    /// Skip dependency and metadata directories while searching
    pub auto_exclude: bool,
    /// Report total size of the matches
    pub show_size:    bool,
    /// Only match entries older than this
    pub older_than:   Option<AgeFilter>,
    /// Only match files larger than this
    pub larger_than:  Option<SizeFilter>,
    /// Match empty directories instead of a pattern
    pub empty_dirs:   bool,
    /// Maximum number of matches rendered while searching
    pub max_display:  usize,
    /// Allow the external `fd` search
    pub use_fd:       bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pattern:      String::new(),
            root:         PathBuf::from("."),
            dry_run:      false,
            force:        false,
            ignore_case:  false,
            type_filter:  TypeFilter::Any,
            auto_exclude: true,
            show_size:    false,
            older_than:   None,
            larger_than:  None,
            empty_dirs:   false,
            max_display:  DEFAULT_MAX_DISPLAY,
            use_fd:       std::env::var_os(NO_FD_ENV).is_none(),
        }
    }
}

impl RunOptions {
    /// Options for `pattern` under `root` with everything else defaulted
    pub fn new(pattern: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self { pattern: pattern.into(), root: root.into(), ..Self::default() }
    }

    /// Check the options before any work is done
    ///
    /// # Errors
    /// Returns a validation error if the root is missing or not a directory,
    /// or the pattern is empty outside empty-dirs mode.
    pub fn validate(&self) -> Result<()> {
        if !self.root.exists() {
            return Err(Error::validation(&format!(
                "Directory '{}' does not exist",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            return Err(Error::validation(&format!("Not a directory: {}", self.root.display())));
        }
        if self.pattern.trim().is_empty() && !self.empty_dirs {
            return Err(Error::validation("Pattern cannot be empty"));
        }
        Ok(())
    }

    /// Human description of what is searched for
    #[must_use]
    pub fn describe_pattern(&self) -> &str {
        if self.empty_dirs { "(empty directories)" } else { &self.pattern }
    }
}

/// Parse the `--type` argument
///
/// # Errors
/// Returns a validation error unless the value is `f` or `d`.
pub fn parse_type_filter(value: &str) -> Result<TypeFilter> {
    match value {
        "f" => Ok(TypeFilter::File),
        "d" => Ok(TypeFilter::Dir),
        _ => Err(Error::validation("Type must be 'f' (file) or 'd' (directory)")),
    }
}
