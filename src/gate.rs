//! Permission and confirmation checks between search and deletion
//!
//! The gate walks a fixed sequence of stages. Each stage either hands the
//! candidate set to the next one or ends the run with an [`Outcome`]:
//!
//! ```text
//! Summarizing -> PrivilegeCheck -> [SizeReport] -> Excluding -> Previewing
//!     -> DryRun | [ConfirmCritical] -> [ConfirmFinal] -> Deleting -> Done
//! ```

use std::io::{self, Write};
use std::mem;
use std::path::Path;

use log::{debug, info};

use crate::crawler::disk_usage;
use crate::delete::{DeletionTally, delete, delete_all_with};
use crate::display::Display;
use crate::error::{Result, exit_code};
use crate::exclusion::ExclusionSet;
use crate::options::RunOptions;
use crate::prompt::Prompter;
use crate::types::{CRITICAL_CONFIRMATION, Category, CategoryCounts, SearchResult};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The search produced nothing
    NoMatches,
    /// Every match was critical and the process is not elevated
    NothingDeletable,
    /// The operator excluded every match
    AllExcluded,
    /// Dry run stopped after the preview
    DryRun,
    /// The operator declined a confirmation
    Cancelled,
    /// Deletion ran; individual failures are part of the tally
    Completed(DeletionTally),
}

impl Outcome {
    /// Process exit code for this outcome
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NoMatches | Self::NothingDeletable => exit_code::FAILURE,
            Self::Cancelled => exit_code::CANCELLED,
            Self::AllExcluded | Self::DryRun | Self::Completed(_) => exit_code::SUCCESS,
        }
    }
}

#[derive(Debug)]
enum Stage {
    Summarizing,
    PrivilegeCheck,
    SizeReport,
    Excluding,
    Previewing,
    ConfirmCritical,
    ConfirmFinal,
    Deleting,
    Done(Outcome),
}

/// Decides whether, and which, matches get deleted
#[derive(Debug)]
pub struct DeletionGate<'a, P: ?Sized, W> {
    options:  &'a RunOptions,
    elevated: bool,
    prompter: &'a mut P,
    display:  &'a mut Display<W>,
    remove:   fn(&Path) -> io::Result<()>,
}

impl<'a, P, W> DeletionGate<'a, P, W>
where
    P: Prompter + ?Sized,
    W: Write,
{
    /// Create a gate for one run
    pub const fn new(
        options: &'a RunOptions,
        elevated: bool,
        prompter: &'a mut P,
        display: &'a mut Display<W>,
    ) -> Self {
        Self { options, elevated, prompter, display, remove: delete }
    }

    /// Use `remove` instead of [`delete`] for each confirmed path
    #[must_use]
    pub fn with_remover(mut self, remove: fn(&Path) -> io::Result<()>) -> Self {
        self.remove = remove;
        self
    }

    /// Take `results` through every stage and report how the run ended
    ///
    /// # Errors
    /// Returns error if the terminal cannot be written to or read from.
    pub fn run(mut self, mut results: Vec<SearchResult>) -> Result<Outcome> {
        let mut stage = Stage::Summarizing;

        loop {
            debug!("Gate stage {stage:?} with {} candidates", results.len());
            stage = match stage {
                Stage::Summarizing => {
                    self.display.match_summary(CategoryCounts::of(&results))?;
                    Stage::PrivilegeCheck
                },
                Stage::PrivilegeCheck => self.check_privilege(&mut results)?,
                Stage::SizeReport => {
                    self.display.calculating_size()?;
                    self.display.total_size(total_size(&results))?;
                    Stage::Excluding
                },
                Stage::Excluding => self.exclude(&mut results)?,
                Stage::Previewing => self.preview(&results)?,
                Stage::ConfirmCritical => self.confirm_critical(&results)?,
                Stage::ConfirmFinal => self.confirm_final(results.len())?,
                Stage::Deleting => Stage::Done(Outcome::Completed(self.delete(&results)?)),
                Stage::Done(outcome) => {
                    info!("Run finished: {outcome:?}");
                    return Ok(outcome);
                },
            };
        }
    }

    fn after_privilege_check(&self) -> Stage {
        if self.options.show_size { Stage::SizeReport } else { Stage::Excluding }
    }

    fn check_privilege(&mut self, results: &mut Vec<SearchResult>) -> io::Result<Stage> {
        let critical = CategoryCounts::of(results).critical;
        if critical == 0 || self.elevated {
            return Ok(self.after_privilege_check());
        }

        info!("Dropping {critical} critical matches, process is not elevated");
        results.retain(|result| result.category != Category::Critical);
        self.display.no_permission_warning(critical)?;
        if results.is_empty() {
            self.display.nothing_deletable()?;
            return Ok(Stage::Done(Outcome::NothingDeletable));
        }
        self.display.proceeding(results.len())?;
        Ok(self.after_privilege_check())
    }

    fn exclude(&mut self, results: &mut Vec<SearchResult>) -> Result<Stage> {
        if self.options.force {
            return Ok(Stage::Previewing);
        }

        self.display.exclusion_banner()?;
        let answer = self.prompter.read_line("> ")?;
        let exclusions = ExclusionSet::parse(&answer);
        if exclusions.is_empty() {
            return Ok(Stage::Previewing);
        }

        let (kept, excluded) = exclusions.partition(mem::take(results));
        info!("Excluded {} of {} matches", excluded.len(), kept.len() + excluded.len());
        self.display.excluded(&excluded)?;
        *results = kept;
        if results.is_empty() {
            self.display.all_excluded()?;
            return Ok(Stage::Done(Outcome::AllExcluded));
        }
        Ok(Stage::Previewing)
    }

    fn preview(&mut self, results: &[SearchResult]) -> io::Result<Stage> {
        self.display.preview(results)?;
        if self.options.show_size {
            self.display.total_size(total_size(results))?;
        }

        if self.options.dry_run {
            self.display.dry_run_notice()?;
            return Ok(Stage::Done(Outcome::DryRun));
        }
        if self.options.force {
            return Ok(Stage::Deleting);
        }
        let has_critical = results.iter().any(|result| result.category == Category::Critical);
        if self.elevated && has_critical {
            Ok(Stage::ConfirmCritical)
        } else {
            Ok(Stage::ConfirmFinal)
        }
    }

    fn confirm_critical(&mut self, results: &[SearchResult]) -> Result<Stage> {
        self.display.critical_warning(CategoryCounts::of(results).critical)?;
        let answer = self.prompter.read_line("> ")?;
        if answer == CRITICAL_CONFIRMATION {
            Ok(Stage::ConfirmFinal)
        } else {
            self.display.cancelled(true)?;
            Ok(Stage::Done(Outcome::Cancelled))
        }
    }

    fn confirm_final(&mut self, count: usize) -> Result<Stage> {
        self.display.final_banner()?;
        let answer = self.prompter.read_line(&format!("Delete {count} items? [y/N]: "))?;
        if answer.eq_ignore_ascii_case("y") {
            Ok(Stage::Deleting)
        } else {
            self.display.cancelled(false)?;
            Ok(Stage::Done(Outcome::Cancelled))
        }
    }

    fn delete(&mut self, results: &[SearchResult]) -> io::Result<DeletionTally> {
        self.display.deleting()?;

        let mut write_error = None;
        let tally = delete_all_with(results, self.remove, |result, status| {
            if let Err(e) = self.display.deletion(result, status) {
                write_error.get_or_insert(e);
            }
        });
        if let Some(e) = write_error {
            return Err(e);
        }

        info!("Deleted {}, failed {}, skipped {}", tally.deleted, tally.failed, tally.skipped);
        self.display.deletion_summary(tally)?;
        Ok(tally)
    }
}

/// Combined size of all results, directories counted recursively
fn total_size(results: &[SearchResult]) -> u64 {
    results.iter().map(|result| disk_usage(&result.path)).sum()
}
