//! Directory crawler implementation

use std::fmt;
use std::fs::{self, FileType, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Maximum directory depth the crawler descends to
pub const MAX_DEPTH: usize = 1_000;

/// A single entry discovered below the crawl root
#[derive(Debug, Clone)]
pub struct Entry {
    /// Full path of the entry
    pub path:      PathBuf,
    /// File type, symlinks are not followed
    pub file_type: FileType,
    /// Depth below the root, direct children are at depth 1
    pub depth:     usize,
}

impl Entry {
    /// Whether the entry is a directory (a symlink to one is not)
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    /// Metadata of the entry itself, without following symlinks
    ///
    /// # Errors
    /// Returns error if the entry vanished or cannot be inspected.
    pub fn metadata(&self) -> io::Result<Metadata> {
        fs::symlink_metadata(&self.path)
    }

    /// File name of the entry
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

/// Depth-first directory crawler yielding entries lazily
///
/// Entries are produced in pre-order with the children of each directory
/// sorted by name. The root itself is never yielded. Any entry for which the
/// prune predicate returns `true` is skipped, and if it is a directory its
/// whole subtree is left unvisited. Unreadable directories are skipped.
pub struct Crawler<F> {
    /// Entries waiting to be yielded, next entry on top
    stack:      Vec<Entry>,
    /// Decides which entries are skipped along with their subtree
    prune:      F,
    /// Number of files yielded so far
    file_count: usize,
    /// Number of directories yielded so far
    dir_count:  usize,
}

impl<F> fmt::Debug for Crawler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("pending", &self.stack.len())
            .field("file_count", &self.file_count)
            .field("dir_count", &self.dir_count)
            .finish_non_exhaustive()
    }
}

impl Crawler<fn(&Path) -> bool> {
    /// Create a crawler that visits everything below `root`
    ///
    /// # Errors
    /// Returns error if `root` is not a readable directory.
    pub fn new(root: &Path) -> Result<Self> {
        fn keep(_: &Path) -> bool {
            false
        }
        Self::with_prune(root, keep)
    }
}

impl<F: FnMut(&Path) -> bool> Crawler<F> {
    /// Create a crawler starting at the given root with a prune predicate
    ///
    /// # Errors
    /// Returns error if `root` is not a readable directory.
    pub fn with_prune(root: &Path, prune: F) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::validation(&format!("Not a directory: {}", root.display())));
        }

        let mut crawler = Self { stack: Vec::new(), prune, file_count: 0, dir_count: 0 };
        let children = read_children(root, 1)?;
        crawler.stack.extend(children.into_iter().rev());
        Ok(crawler)
    }

    /// Get the current progress of the crawl
    ///
    /// Returns a tuple of:
    /// - Number of files yielded so far
    /// - Number of directories yielded so far
    #[must_use = "Progress information should be used for monitoring"]
    pub const fn progress(&self) -> (usize, usize) {
        (self.file_count, self.dir_count)
    }
}

impl<F: FnMut(&Path) -> bool> Iterator for Crawler<F> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            let entry = self.stack.pop()?;

            if (self.prune)(&entry.path) {
                debug!("Pruned {}", entry.path.display());
                continue;
            }

            if entry.is_dir() {
                self.dir_count += 1;
                if entry.depth < MAX_DEPTH {
                    match read_children(&entry.path, entry.depth + 1) {
                        Ok(children) => self.stack.extend(children.into_iter().rev()),
                        Err(e) => debug!("Skipping unreadable {}: {e}", entry.path.display()),
                    }
                } else {
                    debug!("Depth limit reached at {}", entry.path.display());
                }
            } else {
                self.file_count += 1;
            }

            return Some(entry);
        }
    }
}

/// Read the entries of `dir`, sorted by file name
fn read_children(dir: &Path, depth: usize) -> Result<Vec<Entry>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else { continue };
        children.push(Entry { path: entry.path(), file_type, depth });
    }
    children.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(children)
}

/// Whether `path` is a directory with no entries
#[must_use]
pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_none())
}

/// Total size in bytes of a file, or of every file below a directory
///
/// Symlinks are counted as themselves and never followed. Unreadable entries
/// count as zero.
#[must_use]
pub fn disk_usage(path: &Path) -> u64 {
    let Ok(metadata) = fs::symlink_metadata(path) else {
        return 0;
    };
    if !metadata.is_dir() {
        return metadata.len();
    }

    Crawler::new(path).map_or(0, |crawler| {
        crawler
            .filter(|entry| !entry.is_dir())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn names(temp_dir: &TempDir, crawler: impl Iterator<Item = Entry>) -> Vec<String> {
        crawler
            .map(|e| {
                e.path.strip_prefix(temp_dir.path()).unwrap().to_string_lossy().replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_new_crawler() {
        let temp_dir = TempDir::new().unwrap();
        let crawler = Crawler::new(temp_dir.path());
        assert!(crawler.is_ok());
    }

    #[test]
    fn test_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        File::create(&file).unwrap();
        assert!(matches!(Crawler::new(&file), Err(Error::Validation(_))));
        assert!(Crawler::new(&temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut crawler = Crawler::new(temp_dir.path()).unwrap();
        assert!(crawler.next().is_none());
        assert_eq!(crawler.progress(), (0, 0));
    }

    #[test]
    fn test_preorder_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("b/inner")).unwrap();
        File::create(temp_dir.path().join("a.txt")).unwrap();
        File::create(temp_dir.path().join("b/inner/deep.txt")).unwrap();
        File::create(temp_dir.path().join("c.txt")).unwrap();

        let crawler = Crawler::new(temp_dir.path()).unwrap();
        assert_eq!(
            names(&temp_dir, crawler),
            ["a.txt", "b", "b/inner", "b/inner/deep.txt", "c.txt"]
        );
    }

    #[test]
    fn test_prune_skips_subtree() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("node_modules/pkg")).unwrap();
        File::create(temp_dir.path().join("node_modules/pkg/index.js")).unwrap();
        File::create(temp_dir.path().join("main.js")).unwrap();

        let crawler = Crawler::with_prune(temp_dir.path(), |path: &Path| {
            path.to_string_lossy().contains("node_modules")
        })
        .unwrap();
        assert_eq!(names(&temp_dir, crawler), ["main.js"]);
    }

    #[test]
    fn test_progress_reporting() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..3 {
            let subdir = temp_dir.path().join(format!("dir_{i}"));
            fs::create_dir(&subdir).unwrap();
            for j in 0..2 {
                File::create(subdir.join(format!("file_{j}.txt"))).unwrap();
            }
        }

        let mut crawler = Crawler::new(temp_dir.path()).unwrap();
        let mut last = (0, 0);
        while crawler.next().is_some() {
            let now = crawler.progress();
            assert!(now.0 >= last.0 && now.1 >= last.1, "Progress must not decrease");
            last = now;
        }
        assert_eq!(crawler.progress(), (6, 3));
    }

    #[test]
    fn test_depth_recorded() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("one/two")).unwrap();
        let depths: Vec<usize> = Crawler::new(temp_dir.path()).unwrap().map(|e| e.depth).collect();
        assert_eq!(depths, [1, 2]);
    }

    #[test]
    fn test_is_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty");
        fs::create_dir(&empty).unwrap();
        File::create(temp_dir.path().join("file")).unwrap();

        assert!(is_empty_dir(&empty));
        assert!(!is_empty_dir(temp_dir.path()));
        assert!(!is_empty_dir(&temp_dir.path().join("file")));
        assert!(!is_empty_dir(&temp_dir.path().join("missing")));
    }

    #[test]
    fn test_disk_usage() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        File::create(temp_dir.path().join("a.bin")).unwrap().write_all(&[0u8; 100]).unwrap();
        File::create(temp_dir.path().join("sub/b.bin")).unwrap().write_all(&[0u8; 50]).unwrap();

        assert_eq!(disk_usage(&temp_dir.path().join("a.bin")), 100);
        assert_eq!(disk_usage(temp_dir.path()), 150);
        assert_eq!(disk_usage(&temp_dir.path().join("missing")), 0);
    }
}
