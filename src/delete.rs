//! Removal of matched paths

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};

use crate::types::SearchResult;

/// Remove a file, symlink or whole directory tree
///
/// Symlinks are removed themselves, never their targets.
///
/// # Errors
/// Returns the underlying error if the path cannot be inspected or removed.
pub fn delete(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() { fs::remove_dir_all(path) } else { fs::remove_file(path) }
}

/// What happened to one path during a batch deletion
#[derive(Debug)]
pub enum DeleteStatus {
    /// The path was removed
    Deleted,
    /// The path no longer existed, nothing was attempted
    Missing,
    /// Removal was attempted and failed
    Failed(io::Error),
}

/// Counts of a batch deletion
///
/// `deleted + failed` equals the number of paths that still existed when
/// their turn came.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionTally {
    /// Paths removed
    pub deleted: usize,
    /// Paths whose removal failed
    pub failed:  usize,
    /// Paths that had already disappeared
    pub skipped: usize,
}

impl DeletionTally {
    /// Paths removal was attempted on
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.deleted + self.failed
    }
}

/// Delete every result, reporting each outcome through `on_each`
///
/// A failure never stops the batch.
pub fn delete_all<F>(results: &[SearchResult], on_each: F) -> DeletionTally
where
    F: FnMut(&SearchResult, &DeleteStatus),
{
    delete_all_with(results, delete, on_each)
}

/// [`delete_all`] with a custom removal primitive
pub fn delete_all_with<R, F>(
    results: &[SearchResult],
    mut remove: R,
    mut on_each: F,
) -> DeletionTally
where
    R: FnMut(&Path) -> io::Result<()>,
    F: FnMut(&SearchResult, &DeleteStatus),
{
    let mut tally = DeletionTally::default();

    for result in results {
        let status = match fs::symlink_metadata(&result.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Already gone: {}", result.path.display());
                tally.skipped += 1;
                DeleteStatus::Missing
            },
            _ => match remove(&result.path) {
                Ok(()) => {
                    tally.deleted += 1;
                    DeleteStatus::Deleted
                },
                Err(e) => {
                    warn!("Failed to delete {}: {e}", result.path.display());
                    tally.failed += 1;
                    DeleteStatus::Failed(e)
                },
            },
        };
        on_each(result, &status);
    }

    tally
}
