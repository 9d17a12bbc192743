//! Terminal presentation of search results and run progress

use std::fs;
use std::io::{self, Write};
use std::path::MAIN_SEPARATOR;

use colored::Colorize;
use humansize::{BINARY, format_size};

use crate::delete::{DeleteStatus, DeletionTally};
use crate::types::{CRITICAL_CONFIRMATION, Category, CategoryCounts, PREVIEW_LIMIT, SearchResult};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Writes everything the operator sees, except prompts
#[derive(Debug)]
pub struct Display<W> {
    out:       W,
    show_size: bool,
}

impl<W: Write> Display<W> {
    /// Render to `out`; sizes are shown next to files when `show_size` is set
    pub const fn new(out: W, show_size: bool) -> Self {
        Self { out, show_size }
    }

    /// Consume the display, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Tool name and version banner
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn header(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "{} v{}",
            "delf - Delete Folder/File".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out, "{}", RULE.bold())?;
        writeln!(self.out)
    }

    /// Plain informational line
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// Error line, used for rejected interactive input
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn error(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{} {text}", "ERROR:".red())
    }

    /// Where, what and how the search runs
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn search_info(&mut self, root: &str, pattern: &str, method: &str) -> io::Result<()> {
        writeln!(self.out, "{} {}", "Path:".blue(), root.cyan())?;
        writeln!(self.out, "{} {}", "Pattern:".blue(), pattern.yellow())?;
        writeln!(self.out, "{} {}", "Method:".blue(), method)?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Matches:".bold())
    }

    /// Render results as they arrive, up to `cap` entries, and collect all of them
    ///
    /// Once the cap is passed a single notice is printed and the remaining
    /// results are collected silently.
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn stream<I>(&mut self, results: I, cap: usize) -> io::Result<Vec<SearchResult>>
    where
        I: IntoIterator<Item = SearchResult>,
    {
        let mut collected = Vec::new();
        for result in results {
            let count = collected.len() + 1;
            if count <= cap {
                self.result(&result)?;
            } else if count == cap + 1 {
                writeln!(self.out, "{}", "  ... (more results, display limit reached)".yellow())?;
            }
            collected.push(result);
        }
        Ok(collected)
    }

    /// One streamed match with its safety marker
    fn result(&mut self, result: &SearchResult) -> io::Result<()> {
        let mut text = result.path.display().to_string();
        if result.is_dir {
            text.push(MAIN_SEPARATOR);
        }
        let (marker, text) = match result.category {
            Category::Critical => ("!!!".red().bold(), text.red().bold()),
            Category::Warning => ("!  ".yellow(), text.yellow()),
            Category::Safe => ("   ".normal(), text.red()),
        };

        let size = if self.show_size && !result.is_dir {
            fs::symlink_metadata(&result.path)
                .map(|m| format!(" ({})", format_size(m.len(), BINARY)).dimmed().to_string())
                .unwrap_or_default()
        } else {
            String::new()
        };

        writeln!(self.out, "  {marker} {text}{size}")
    }

    /// Nothing matched
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn no_matches(&mut self, pattern: &str, auto_exclude: bool) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} for pattern: {}",
            "No matches found".yellow().bold(),
            pattern.cyan()
        )?;
        if auto_exclude {
            writeln!(
                self.out,
                "{} Auto-exclusions are enabled. Use {} flag to disable.",
                "Note:".yellow(),
                "-a".cyan()
            )?;
        }
        Ok(())
    }

    /// Totals per safety tier
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn match_summary(&mut self, counts: CategoryCounts) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE.bold())?;
        writeln!(self.out, "Found {} total matches", counts.total().to_string().yellow())?;
        if counts.critical > 0 {
            let label = "!!! Critical system files:".red().bold();
            writeln!(self.out, "  {label} {}", counts.critical)?;
        }
        if counts.warning > 0 {
            writeln!(self.out, "  {} {}", "!  Warning-level files:".yellow(), counts.warning)?;
        }
        if counts.safe > 0 {
            writeln!(self.out, "  {} {}", "OK Safe files:".green(), counts.safe)?;
        }
        Ok(())
    }

    /// Critical matches were dropped because the process is not elevated
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn no_permission_warning(&mut self, critical: usize) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{} {critical} {}",
            "!!! DANGER:".red().bold(),
            "files are CRITICAL SYSTEM FILES!".red().bold()
        )?;
        writeln!(self.out, "Deleting them requires Administrator/root privileges.")?;
        writeln!(self.out, "{}", "They have been removed from the deletion list.".yellow())
    }

    /// Every match was critical and the process is not elevated
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn nothing_deletable(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            "All matched files are system files. Nothing can be deleted without elevation."
                .yellow()
        )
    }

    /// Continuing with the non-critical remainder
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn proceeding(&mut self, count: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            format!("Proceeding with {count} safe/warning-level files only...").green()
        )
    }

    /// Size calculation has started
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn calculating_size(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Calculating total size...".blue())
    }

    /// Total size of the current candidates
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn total_size(&mut self, bytes: u64) -> io::Result<()> {
        writeln!(self.out, "{} {}", "Total size:".bold(), format_size(bytes, BINARY).yellow())
    }

    /// Instructions shown before the exclusion prompt
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn exclusion_banner(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE.bold())?;
        writeln!(
            self.out,
            "{} (comma-separated, or press Enter to skip):",
            "Enter exclusion patterns".cyan()
        )?;
        writeln!(self.out, "{} */important/*, *.txt, backup", "Examples:".yellow())?;
        self.out.flush()
    }

    /// Results removed by the operator's exclusions
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn excluded(&mut self, excluded: &[SearchResult]) -> io::Result<()> {
        if excluded.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "{} ({} items):", "Excluded".green().bold(), excluded.len())?;
        for result in excluded {
            writeln!(self.out, "{} {}", "  OK".green(), result.path.display())?;
        }
        Ok(())
    }

    /// Exclusions removed everything
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn all_excluded(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "All files excluded. Nothing to delete.".green().bold())
    }

    /// First entries of what is about to be deleted
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn preview(&mut self, results: &[SearchResult]) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE.bold())?;
        writeln!(self.out, "{} {} items:", "Will delete".red().bold(), results.len())?;
        writeln!(self.out)?;

        for result in results.iter().take(PREVIEW_LIMIT) {
            if result.is_dir {
                writeln!(
                    self.out,
                    "{} {}",
                    "  [D]".red(),
                    format!("{}{MAIN_SEPARATOR}", result.path.display()).red()
                )?;
            } else {
                let path = result.path.display().to_string();
                writeln!(self.out, "{} {}", "  [F]".red(), path.red())?;
            }
        }

        let remaining = results.len().saturating_sub(PREVIEW_LIMIT);
        if remaining > 0 {
            writeln!(self.out, "{}", format!("  ... and {remaining} more").yellow())?;
        }
        Ok(())
    }

    /// Dry run ended before deletion
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn dry_run_notice(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{} No files were deleted", "DRY-RUN MODE:".yellow().bold())?;
        writeln!(self.out, "Remove {} flag to actually delete these files", "-n".cyan())
    }

    /// Warning and instructions before the critical confirmation
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn critical_warning(&mut self, critical: usize) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE.red().bold())?;
        writeln!(
            self.out,
            "{} {critical} {}",
            "You are about to delete".red().bold(),
            "SYSTEM FILES!".red().bold()
        )?;
        writeln!(self.out, "This can make the operating system unusable.")?;
        writeln!(self.out, "{}", RULE.red().bold())?;
        writeln!(
            self.out,
            "{} {}",
            "To proceed, type exactly:".red().bold(),
            CRITICAL_CONFIRMATION.yellow()
        )?;
        self.out.flush()
    }

    /// Separator before the final yes/no question
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn final_banner(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE.bold())?;
        self.out.flush()
    }

    /// The operator declined
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn cancelled(&mut self, critical: bool) -> io::Result<()> {
        writeln!(self.out)?;
        if critical {
            writeln!(self.out, "{}", "Operation cancelled. System is safe.".green())
        } else {
            writeln!(self.out, "{}", "Operation cancelled".yellow())
        }
    }

    /// Deletion is starting
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn deleting(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Deleting...".red().bold())?;
        writeln!(self.out)
    }

    /// Outcome for one path
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn deletion(&mut self, result: &SearchResult, status: &DeleteStatus) -> io::Result<()> {
        match status {
            DeleteStatus::Deleted => writeln!(
                self.out,
                "{} Deleted: {}",
                "OK".green(),
                result.path.display().to_string().red()
            ),
            DeleteStatus::Failed(e) => writeln!(
                self.out,
                "{} Failed: {} {}",
                "X".red(),
                result.path.display(),
                format!("({e})").yellow()
            ),
            DeleteStatus::Missing => Ok(()),
        }
    }

    /// Final counts of a deletion
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn deletion_summary(&mut self, tally: DeletionTally) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", RULE.bold())?;
        writeln!(self.out, "{} {} items", "OK Deleted:".green().bold(), tally.deleted)?;
        if tally.failed > 0 {
            writeln!(
                self.out,
                "{} {} items (try running as Administrator/root)",
                "X Failed:".red().bold(),
                tally.failed
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> Display<Vec<u8>> {
        colored::control::set_override(false);
        Display::new(Vec::new(), false)
    }

    fn text(display: Display<Vec<u8>>) -> String {
        String::from_utf8(display.into_inner()).unwrap()
    }

    fn results(count: usize) -> Vec<SearchResult> {
        (0..count).map(|i| SearchResult::new(format!("/r/{i}"), Category::Safe, false)).collect()
    }

    #[test]
    fn test_stream_caps_display() {
        let mut d = display();
        let collected = d.stream(results(5), 2).unwrap();
        let out = text(d);

        assert_eq!(collected.len(), 5);
        assert!(out.contains("/r/0") && out.contains("/r/1"));
        assert!(!out.contains("/r/2"));
        assert_eq!(out.matches("display limit reached").count(), 1);
    }

    #[test]
    fn test_stream_marks_categories() {
        let mut d = display();
        let input = vec![
            SearchResult::new("/etc/x", Category::Critical, false),
            SearchResult::new("/home/y", Category::Warning, true),
        ];
        d.stream(input, 10).unwrap();
        let out = text(d);
        assert!(out.contains("!!! /etc/x"));
        assert!(out.contains(&format!("!   /home/y{MAIN_SEPARATOR}")));
    }

    #[test]
    fn test_preview_limit() {
        let mut d = display();
        d.preview(&results(PREVIEW_LIMIT + 3)).unwrap();
        let out = text(d);
        assert!(out.contains(&format!("Will delete {} items", PREVIEW_LIMIT + 3)));
        assert_eq!(out.matches("[F]").count(), PREVIEW_LIMIT);
        assert!(out.contains("... and 3 more"));
    }

    #[test]
    fn test_summary_counts() {
        let mut d = display();
        d.match_summary(CategoryCounts { critical: 1, warning: 0, safe: 2 }).unwrap();
        let out = text(d);
        assert!(out.contains("Found 3 total matches"));
        assert!(out.contains("Critical system files: 1"));
        assert!(!out.contains("Warning-level"));
    }

    #[test]
    fn test_deletion_summary_shows_failures() {
        let mut d = display();
        d.deletion_summary(DeletionTally { deleted: 3, failed: 1, skipped: 0 }).unwrap();
        let out = text(d);
        assert!(out.contains("OK Deleted: 3 items"));
        assert!(out.contains("X Failed: 1 items"));
    }
}
