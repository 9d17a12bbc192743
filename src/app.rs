//! One complete run: validate, search, show and gate

use std::io::Write;

use log::{debug, info};

use crate::classifier::{PathClassifier, absolute_clean};
use crate::display::Display;
use crate::error::{Error, Result};
use crate::gate::{DeletionGate, Outcome};
use crate::options::RunOptions;
use crate::prompt::Prompter;
use crate::search::{select_searcher, start_search};

/// Run a search-and-delete pass described by `options`
///
/// `elevated` tells whether the process may touch critical paths.
///
/// # Errors
/// Returns a validation error for bad options, an elevation error when the
/// search root is itself a protected system path and `elevated` is false, or
/// an IO error if the terminal fails.
pub fn execute<P, W>(
    options: &RunOptions,
    classifier: &PathClassifier,
    elevated: bool,
    prompter: &mut P,
    display: &mut Display<W>,
) -> Result<Outcome>
where
    P: Prompter + ?Sized,
    W: Write,
{
    options.validate()?;

    let root = absolute_clean(&options.root);
    if !elevated && classifier.is_protected_root(&root) {
        return Err(Error::elevation_required(&root.to_string_lossy()));
    }

    let searcher = select_searcher(options);
    let (searcher, results) = start_search(searcher, options, classifier)?;
    info!("Searching {} with {}", root.display(), searcher.description());

    display.search_info(
        &options.root.display().to_string(),
        options.describe_pattern(),
        searcher.description(),
    )?;
    let results = display.stream(results, options.max_display)?;
    debug!("Search produced {} matches", results.len());

    if results.is_empty() {
        display.no_matches(options.describe_pattern(), options.auto_exclude)?;
        return Ok(Outcome::NoMatches);
    }

    DeletionGate::new(options, elevated, prompter, display).run(results)
}
