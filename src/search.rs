//! Search strategies producing candidate paths
//!
//! Two strategies exist behind the [`Searcher`] trait: [`FdSearch`] delegates
//! to the external `fd` tool and [`WalkSearch`] walks the tree in process.
//! One of them is chosen per run by [`select_searcher`]. Both yield results
//! lazily so the caller decides how many to render.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, Metadata};
use std::io::{self, BufRead, BufReader, Split};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use log::debug;

use crate::classifier::{PathClassifier, absolute_clean};
use crate::crawler::{Crawler, Entry, is_empty_dir};
use crate::error::{Error, Result};
use crate::filters::SizeFilter;
use crate::options::RunOptions;
use crate::types::{SearchResult, TypeFilter};

/// Names the `fd` binary is installed under
pub const FD_PROGRAMS: &[&str] = &["fd", "fdfind"];

/// Lazily produced search results
pub type ResultIter<'a> = Box<dyn Iterator<Item = SearchResult> + 'a>;

/// A strategy for enumerating candidate paths
pub trait Searcher: fmt::Debug {
    /// Short label shown to the operator
    fn description(&self) -> &'static str;

    /// Whether this strategy runs an external process
    fn is_delegated(&self) -> bool;

    /// Start enumerating matches for `options`
    ///
    /// # Errors
    /// Returns error if the search cannot be started. Errors while the search
    /// is running skip the affected entry instead.
    fn search<'a>(
        &self,
        options: &'a RunOptions,
        classifier: &'a PathClassifier,
    ) -> Result<ResultIter<'a>>;
}

/// Compiled glob matched against single names or whole paths
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    matcher: globset::GlobMatcher,
}

impl GlobMatcher {
    /// Compile `pattern`; `*` and `?` never match a path separator
    ///
    /// # Errors
    /// Returns a validation error if the pattern is not a valid glob.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let glob = globset::GlobBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::validation(&format!("Invalid pattern: {e}")))?;
        Ok(Self { matcher: glob.compile_matcher() })
    }

    /// Check if the text matches
    #[must_use]
    pub fn is_match(&self, text: impl AsRef<Path>) -> bool {
        self.matcher.is_match(text)
    }
}

/// In-process recursive walk
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkSearch;

impl Searcher for WalkSearch {
    fn description(&self) -> &'static str {
        "walk (install 'fd' for faster search)"
    }

    fn is_delegated(&self) -> bool {
        false
    }

    fn search<'a>(
        &self,
        options: &'a RunOptions,
        classifier: &'a PathClassifier,
    ) -> Result<ResultIter<'a>> {
        let root = absolute_clean(&options.root);
        let auto_exclude = options.auto_exclude;
        let crawler = Crawler::with_prune(&root, move |path: &Path| {
            auto_exclude && classifier.is_auto_excluded(path)
        })?;

        if options.empty_dirs {
            return Ok(Box::new(
                crawler.filter(|entry| entry.is_dir() && is_empty_dir(&entry.path)).map(
                    move |entry| {
                        let category = classifier.classify(&entry.path);
                        SearchResult::new(entry.path, category, true)
                    },
                ),
            ));
        }

        let matcher = if options.pattern.is_empty() {
            None
        } else {
            Some(GlobMatcher::new(&options.pattern, options.ignore_case)?)
        };

        Ok(Box::new(crawler.filter_map(move |entry| {
            walk_filter(&entry, options, matcher.as_ref()).then(|| {
                let category = classifier.classify(&entry.path);
                let is_dir = entry.is_dir();
                SearchResult::new(entry.path, category, is_dir)
            })
        })))
    }
}

/// Type, name, age and size predicates of the in-process walk
fn walk_filter(entry: &Entry, options: &RunOptions, matcher: Option<&GlobMatcher>) -> bool {
    let is_dir = entry.is_dir();
    if !options.type_filter.accepts(is_dir) {
        return false;
    }

    if let Some(matcher) = matcher {
        if !matcher.is_match(entry.file_name()) {
            return false;
        }
    }

    if options.older_than.is_none() && options.larger_than.is_none() {
        return true;
    }

    let Ok(metadata) = entry.metadata() else {
        debug!("Skipping {}: metadata unavailable", entry.path.display());
        return false;
    };

    if let Some(age) = &options.older_than {
        match metadata.modified() {
            Ok(modified) if age.passes(modified) => {},
            _ => return false,
        }
    }

    options.larger_than.is_none_or(|size| size.passes(is_dir, metadata.len()))
}

/// Search delegated to the external `fd` tool
#[derive(Debug, Clone)]
pub struct FdSearch {
    program: OsString,
}

impl FdSearch {
    /// Use the given program as `fd`
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self { program: program.into() }
    }

    /// Find a runnable `fd` on the `PATH`
    #[must_use]
    pub fn locate() -> Option<Self> {
        FD_PROGRAMS.iter().find_map(|program| {
            let status = Command::new(program)
                .arg("--version")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match status {
                Ok(status) if status.success() => Some(Self::with_program(*program)),
                Ok(status) => {
                    debug!("{program} --version exited with {status}");
                    None
                },
                Err(e) => {
                    debug!("{program} not available: {e}");
                    None
                },
            }
        })
    }

    /// Command line arguments translating `options` for `fd`
    ///
    /// The size threshold is not passed on: `fd` compares inclusively and
    /// drops directories, so it is applied to the output lines instead.
    #[must_use]
    pub fn args(options: &RunOptions, classifier: &PathClassifier, root: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> =
            ["--color", "never", "--hidden", "--no-ignore"].map(OsString::from).into();

        match options.type_filter {
            TypeFilter::File => args.extend(["-t", "f"].map(OsString::from)),
            TypeFilter::Dir => args.extend(["-t", "d"].map(OsString::from)),
            TypeFilter::Any => {},
        }

        let case_flag = if options.ignore_case { "-i" } else { "-s" };
        args.push(case_flag.into());

        if let Some(age) = &options.older_than {
            args.push("--changed-before".into());
            args.push(format!("{}days", age.days()).into());
        }

        if options.auto_exclude {
            for fragment in classifier.auto_exclude_patterns() {
                args.push("-E".into());
                args.push(format!("*{fragment}*").into());
            }
        }

        let pattern = if options.pattern.is_empty() { "*" } else { options.pattern.as_str() };
        args.push("--glob".into());
        args.push("--".into());
        args.push(pattern.into());
        args.push(root.as_os_str().to_owned());
        args
    }
}

impl Searcher for FdSearch {
    fn description(&self) -> &'static str {
        "fd (parallel search)"
    }

    fn is_delegated(&self) -> bool {
        true
    }

    fn search<'a>(
        &self,
        options: &'a RunOptions,
        classifier: &'a PathClassifier,
    ) -> Result<ResultIter<'a>> {
        let root = absolute_clean(&options.root);
        let mut command = Command::new(&self.program);
        command.args(Self::args(options, classifier, &root));
        debug!("Running {command:?}");
        let lines =
            LineResults::spawn(command, classifier)?.with_size_filter(options.larger_than);
        Ok(Box::new(DelegatedResults { lines, options, classifier, fallback: None }))
    }
}

/// Output of a delegated search, replaced by the in-process walk when the
/// external process fails before printing anything
pub struct DelegatedResults<'a> {
    lines:      LineResults<'a>,
    options:    &'a RunOptions,
    classifier: &'a PathClassifier,
    fallback:   Option<ResultIter<'a>>,
}

impl fmt::Debug for DelegatedResults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedResults")
            .field("lines", &self.lines)
            .field("fell_back", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

impl Iterator for DelegatedResults<'_> {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        if let Some(fallback) = &mut self.fallback {
            return fallback.next();
        }
        if let Some(result) = self.lines.next() {
            return Some(result);
        }
        if !self.lines.failed_without_output() {
            return None;
        }

        debug!("Delegated search failed without output, falling back to walk");
        match WalkSearch.search(self.options, self.classifier) {
            Ok(results) => self.fallback.insert(results).next(),
            Err(e) => {
                debug!("Fallback walk failed: {e}");
                None
            },
        }
    }
}

/// Results read from the standard output of a child process, one per line
#[derive(Debug)]
pub struct LineResults<'a> {
    child:      Child,
    lines:      Split<BufReader<ChildStdout>>,
    classifier: &'a PathClassifier,
    size:       Option<SizeFilter>,
    lines_read: usize,
    failed:     bool,
    finished:   bool,
}

impl<'a> LineResults<'a> {
    /// Spawn `command` with a piped standard output
    ///
    /// # Errors
    /// Returns error if the process cannot be started.
    pub fn spawn(mut command: Command, classifier: &'a PathClassifier) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "child stdout missing"))?;
        Ok(Self {
            child,
            lines: BufReader::new(stdout).split(b'\n'),
            classifier,
            size: None,
            lines_read: 0,
            failed: false,
            finished: false,
        })
    }

    /// Only yield files larger than the filter's threshold; directories pass
    #[must_use]
    pub fn with_size_filter(mut self, size: Option<SizeFilter>) -> Self {
        self.size = size;
        self
    }

    /// Whether the process ended unsuccessfully without printing a path
    #[must_use]
    pub const fn failed_without_output(&self) -> bool {
        self.finished && self.failed && self.lines_read == 0
    }

    /// Reap the child once its output is exhausted
    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        match self.child.wait() {
            Ok(status) if !status.success() => {
                debug!("Search process exited with {status}");
                self.failed = true;
            },
            Ok(_) => {},
            Err(e) => {
                debug!("Failed to wait for search process: {e}");
                self.failed = true;
            },
        }
    }
}

impl Iterator for LineResults<'_> {
    type Item = SearchResult;

    fn next(&mut self) -> Option<SearchResult> {
        if self.finished {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    let Some(path) = line_to_path(line) else { continue };
                    self.lines_read += 1;
                    let metadata = fs::symlink_metadata(&path).ok();
                    let is_dir = metadata.as_ref().is_some_and(Metadata::is_dir);
                    if let Some(size) = &self.size {
                        if !metadata.as_ref().is_some_and(|m| size.passes(is_dir, m.len())) {
                            continue;
                        }
                    }
                    let category = self.classifier.classify(&path);
                    return Some(SearchResult::new(path, category, is_dir));
                },
                Some(Err(e)) => {
                    debug!("Failed to read search output: {e}");
                    self.failed = true;
                    self.finish();
                    return None;
                },
                None => {
                    self.finish();
                    return None;
                },
            }
        }
    }
}

impl Drop for LineResults<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Turn one output line into a path, dropping line endings and the trailing
/// separator `fd` prints after directories
fn line_to_path(mut line: Vec<u8>) -> Option<PathBuf> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    let separator = MAIN_SEPARATOR as u8;
    while line.len() > 1 && matches!(line.last(), Some(&c) if c == b'/' || c == separator) {
        line.pop();
    }
    if line.is_empty() {
        return None;
    }
    Some(bytes_to_path(line))
}

#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

/// Pick the search strategy for this run
///
/// Empty-directory searches and runs with `fd` disabled always walk.
#[must_use]
pub fn select_searcher(options: &RunOptions) -> Box<dyn Searcher> {
    if options.empty_dirs || !options.use_fd {
        return Box::new(WalkSearch);
    }
    match FdSearch::locate() {
        Some(fd) => Box::new(fd),
        None => Box::new(WalkSearch),
    }
}

/// Start a search with `searcher`, walking instead if it cannot start
///
/// Returns the searcher that actually runs along with its results.
///
/// # Errors
/// Returns error if the in-process walk cannot start either.
pub fn start_search<'a>(
    searcher: Box<dyn Searcher>,
    options: &'a RunOptions,
    classifier: &'a PathClassifier,
) -> Result<(Box<dyn Searcher>, ResultIter<'a>)> {
    match searcher.search(options, classifier) {
        Ok(results) => Ok((searcher, results)),
        Err(e) if searcher.is_delegated() => {
            debug!("Delegated search failed ({e}), falling back to walk");
            let results = WalkSearch.search(options, classifier)?;
            Ok((Box::new(WalkSearch), results))
        },
        Err(e) => Err(e),
    }
}
