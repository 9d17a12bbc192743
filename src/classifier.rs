//! Safety classification of matched paths
//!
//! Every path is tested against two prefix lists. A path under a critical
//! prefix is never deleted without elevated privileges; a path under a warning
//! prefix is flagged but allowed. The test is a plain string prefix on the
//! normalized forms, so `/etc` also covers `/etcetera`.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::types::Category;

/// Directory name fragments skipped during search unless `--all` is given
pub const AUTO_EXCLUDE_PATTERNS: &[&str] =
    &["node_modules", ".git", ".npm", ".cache", ".vscode", ".idea"];

#[cfg(windows)]
const CRITICAL_PATHS: &[&str] = &[
    r"C:\Windows",
    r"C:\Windows\System32",
    r"C:\Windows\SysWOW64",
    r"C:\Program Files",
    r"C:\Program Files (x86)",
    r"C:\ProgramData",
    r"C:\Users\Default",
    r"C:\Users\Public",
    r"C:\Recovery",
    r"C:\Boot",
];

#[cfg(windows)]
const WARNING_PATHS: &[&str] = &[r"C:\Users", r"C:\Temp"];

#[cfg(not(windows))]
const CRITICAL_PATHS: &[&str] = &[
    "/bin",
    "/boot",
    "/dev",
    "/etc",
    "/lib",
    "/lib32",
    "/lib64",
    "/proc",
    "/sbin",
    "/sys",
    "/usr",
    "/var/lib",
    "/System",
    "/Library",
    "/private/etc",
    "/private/var/db",
];

#[cfg(not(windows))]
const WARNING_PATHS: &[&str] = &["/home", "/Users", "/root", "/tmp", "/var/tmp", "/opt"];

/// Environment variables naming system directories
const CRITICAL_ENV_VARS: &[&str] = &["SystemRoot", "windir"];

/// Environment variables naming temp directories
const WARNING_ENV_VARS: &[&str] = &["TEMP", "TMP", "TMPDIR"];

/// Make `path` absolute and resolve `.` and `..` lexically
///
/// Symlinks are not followed; a `..` at the root stays at the root.
#[must_use]
pub fn absolute_clean(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !matches!(clean.components().next_back(), Some(Component::RootDir) | None) {
                    clean.pop();
                }
            },
            other => clean.push(other.as_os_str()),
        }
    }
    clean
}

/// Normalize a path for prefix comparison
///
/// Same as [`absolute_clean`], lowercased on case-insensitive platforms.
#[must_use]
pub fn normalize(path: &Path) -> String {
    let text = absolute_clean(path).to_string_lossy().into_owned();
    if cfg!(any(windows, target_os = "macos")) { text.to_lowercase() } else { text }
}

/// Ordered critical and warning prefix lists
#[derive(Debug, Clone, Default)]
pub struct SafetyLists {
    critical: Vec<String>,
    warning:  Vec<String>,
}

impl SafetyLists {
    /// Build lists from explicit prefixes
    pub fn new<C, W>(critical: C, warning: W) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<Path>,
        W: IntoIterator,
        W::Item: AsRef<Path>,
    {
        Self {
            critical: critical.into_iter().map(|p| normalize(p.as_ref())).collect(),
            warning:  warning.into_iter().map(|p| normalize(p.as_ref())).collect(),
        }
    }

    /// Lists that classify everything as safe
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Platform defaults augmented from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_env(dirs::home_dir(), |name| std::env::var_os(name))
    }

    /// Platform defaults augmented with `home` and the given variable lookup
    ///
    /// The home directory is added as a warning prefix alongside the temp
    /// directories.
    pub fn with_env<F>(home: Option<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let resolve = |names: &[&str]| {
            names
                .iter()
                .filter_map(|name| lookup(*name).filter(|value| !value.is_empty()))
                .map(PathBuf::from)
                .collect::<Vec<_>>()
        };
        let home = home.filter(|home| !home.as_os_str().is_empty());

        let critical =
            CRITICAL_PATHS.iter().map(|p| PathBuf::from(*p)).chain(resolve(CRITICAL_ENV_VARS));
        let warning = WARNING_PATHS
            .iter()
            .map(|p| PathBuf::from(*p))
            .chain(resolve(WARNING_ENV_VARS))
            .chain(home);

        let lists = Self::new(critical, warning);
        debug!(
            "Safety lists: {} critical, {} warning prefixes",
            lists.critical.len(),
            lists.warning.len()
        );
        lists
    }

    /// Normalized critical prefixes
    #[must_use]
    pub fn critical(&self) -> &[String] {
        &self.critical
    }

    /// Normalized warning prefixes
    #[must_use]
    pub fn warning(&self) -> &[String] {
        &self.warning
    }
}

/// Assigns safety tiers and answers auto-exclusion queries
#[derive(Debug, Clone)]
pub struct PathClassifier {
    lists:        SafetyLists,
    auto_exclude: Vec<String>,
}

impl PathClassifier {
    /// Create a classifier over the given lists and auto-exclude fragments
    pub fn new<S: AsRef<str>>(lists: SafetyLists, auto_exclude: &[S]) -> Self {
        let auto_exclude = auto_exclude.iter().map(|p| p.as_ref().to_lowercase()).collect();
        Self { lists, auto_exclude }
    }

    /// Classifier for the running system with the built-in auto-exclude set
    #[must_use]
    pub fn for_system() -> Self {
        Self::new(SafetyLists::from_env(), AUTO_EXCLUDE_PATTERNS)
    }

    /// Safety tier of `path`; critical prefixes win over warning prefixes
    #[must_use]
    pub fn classify(&self, path: &Path) -> Category {
        let normalized = normalize(path);
        if self.lists.critical.iter().any(|prefix| normalized.starts_with(prefix.as_str())) {
            Category::Critical
        } else if self.lists.warning.iter().any(|prefix| normalized.starts_with(prefix.as_str())) {
            Category::Warning
        } else {
            Category::Safe
        }
    }

    /// Whether `path` contains one of the auto-exclude fragments
    #[must_use]
    pub fn is_auto_excluded(&self, path: &Path) -> bool {
        let lowered = path.to_string_lossy().to_lowercase();
        self.auto_exclude.iter().any(|fragment| lowered.contains(fragment.as_str()))
    }

    /// Whether `path` is itself one of the critical entries
    #[must_use]
    pub fn is_protected_root(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        self.lists.critical.iter().any(|prefix| *prefix == normalized)
    }

    /// Lowercased auto-exclude fragments
    #[must_use]
    pub fn auto_exclude_patterns(&self) -> &[String] {
        &self.auto_exclude
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn classifier() -> PathClassifier {
        PathClassifier::new(
            SafetyLists::new(["/etc", "/usr"], ["/home", "/etc/warn-never"]),
            AUTO_EXCLUDE_PATTERNS,
        )
    }

    #[test]
    fn test_classify_tiers() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/etc/passwd")), Category::Critical);
        assert_eq!(c.classify(Path::new("/usr")), Category::Critical);
        assert_eq!(c.classify(Path::new("/home/me/notes.txt")), Category::Warning);
        assert_eq!(c.classify(Path::new("/srv/data")), Category::Safe);
    }

    #[test]
    fn test_critical_checked_before_warning() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/etc/warn-never/x")), Category::Critical);
    }

    #[test]
    fn test_prefix_is_not_segment_aware() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/etcetera")), Category::Critical);
        assert_eq!(c.classify(Path::new("/homework/a")), Category::Warning);
    }

    #[test]
    fn test_classify_normalizes_path() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/srv/../etc/hosts")), Category::Critical);
        assert_eq!(c.classify(Path::new("/etc/./../srv")), Category::Safe);
        assert_eq!(c.classify(Path::new("/../../etc")), Category::Critical);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d/")), "/a/c/d");
        assert_eq!(normalize(Path::new("/..")), "/");
        let relative = normalize(Path::new("x"));
        assert!(Path::new(&relative).is_absolute());
    }

    #[test]
    fn test_empty_lists_are_safe() {
        let c = PathClassifier::new(SafetyLists::empty(), AUTO_EXCLUDE_PATTERNS);
        assert_eq!(c.classify(Path::new("/etc/passwd")), Category::Safe);
    }

    #[test]
    fn test_auto_exclude_substring() {
        let c = classifier();
        assert!(c.is_auto_excluded(Path::new("/p/node_modules/x.js")));
        assert!(c.is_auto_excluded(Path::new("/p/NODE_MODULES")));
        assert!(c.is_auto_excluded(Path::new("/p/.github/workflows")));
        assert!(!c.is_auto_excluded(Path::new("/p/src/main.rs")));
    }

    #[test]
    fn test_protected_root() {
        let c = classifier();
        assert!(c.is_protected_root(Path::new("/etc")));
        assert!(c.is_protected_root(Path::new("/etc/")));
        assert!(!c.is_protected_root(Path::new("/etc/myapp")));
    }

    #[test]
    fn test_env_augmentation() {
        let lists = SafetyLists::with_env(Some(PathBuf::from("/export/me")), |name| match name {
            "SystemRoot" => Some(OsString::from("/opt/sysroot")),
            "TMPDIR" => Some(OsString::from("/scratch")),
            "TEMP" => Some(OsString::new()),
            "HOME" => Some(OsString::from("/ignored/home")),
            _ => None,
        });
        assert!(lists.critical().iter().any(|p| p == "/opt/sysroot"));
        assert!(lists.warning().iter().any(|p| p == "/scratch"));
        assert!(lists.warning().iter().any(|p| p == "/export/me"));
        assert!(!lists.warning().iter().any(|p| p == "/ignored/home"));
        assert!(!lists.warning().iter().any(String::is_empty));
    }

    #[test]
    fn test_missing_home_adds_no_prefix() {
        let lists = SafetyLists::with_env(None, |_| None);
        let defaults = SafetyLists::new(CRITICAL_PATHS, WARNING_PATHS);
        assert_eq!(lists.warning(), defaults.warning());

        let lists = SafetyLists::with_env(Some(PathBuf::new()), |_| None);
        assert_eq!(lists.warning(), defaults.warning());
    }

    #[test]
    fn test_system_lists_include_home() {
        let Some(home) = dirs::home_dir() else { return };
        let lists = SafetyLists::from_env();
        assert!(lists.warning().iter().any(|p| *p == normalize(&home)));
    }
}
