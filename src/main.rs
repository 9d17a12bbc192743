#![warn(
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
//! `delf` - Find and delete files and folders by pattern, with safety checks.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use clap_cargo::style::CLAP_STYLING;
use delf::app::execute;
use delf::classifier::PathClassifier;
use delf::display::Display;
use delf::error::{Result, exit_code};
use delf::filters::{AgeFilter, SizeFilter};
use delf::gate::Outcome;
use delf::options::{RunOptions, parse_type_filter};
use delf::privilege::is_elevated;
use delf::prompt::{LinePrompter, ask_pattern, ask_search_root};
use delf::types::DEFAULT_MAX_DISPLAY;
use log::debug;

/// CLI arguments for `delf`
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    styles = CLAP_STYLING,
    after_help = "Omit PATTERN to be asked for the path and pattern interactively.\n\
                  Exit codes: 0 success, 1 no matches or invalid input, 2 cancelled, \
                  3 elevation required"
)]
struct Cli {
    /// Glob matched against file and folder names (e.g. "*.log", "node_modules")
    pattern: Option<String>,

    /// Directory to search in
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Show what would be deleted without deleting
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Skip exclusions and confirmations
    #[arg(short, long)]
    force: bool,

    /// Match the pattern case-insensitively
    #[arg(short, long)]
    ignore_case: bool,

    /// Only match files (f) or directories (d)
    #[arg(short = 't', long = "type", value_name = "f|d")]
    kind: Option<String>,

    /// Disable auto-exclusion of node_modules, .git and similar folders
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Report the total size of the matches
    #[arg(long)]
    show_size: bool,

    /// Only match entries last modified at least DAYS days ago
    #[arg(long, value_name = "DAYS")]
    older_than: Option<u64>,

    /// Only match files larger than SIZE (e.g. 500K, 10M, 1G)
    #[arg(long, value_name = "SIZE")]
    larger_than: Option<String>,

    /// Find empty directories instead of a pattern
    #[arg(long)]
    empty_dirs: bool,

    /// Maximum number of matches listed while searching
    #[arg(long, value_name = "NUM", default_value_t = DEFAULT_MAX_DISPLAY)]
    max_display: usize,

    /// Log debug details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Whether the path and pattern must be asked for
    const fn is_interactive(&self) -> bool {
        self.pattern.is_none() && !self.empty_dirs
    }

    /// Search root and pattern
    ///
    /// Empty-dirs mode takes no pattern, so a lone positional names the root.
    fn root_and_pattern(&mut self) -> (PathBuf, String) {
        let pattern = self.pattern.take().unwrap_or_default();
        let path = std::mem::take(&mut self.path);
        if self.empty_dirs && !pattern.is_empty() && path == Path::new(".") {
            return (PathBuf::from(pattern), String::new());
        }
        (path, pattern)
    }

    /// Resolve the arguments into run options
    fn into_options(mut self) -> Result<RunOptions> {
        let (root, pattern) = self.root_and_pattern();
        let type_filter = self.kind.as_deref().map(parse_type_filter).transpose()?;
        let larger_than = self.larger_than.as_deref().map(SizeFilter::parse).transpose()?;
        let older_than = self.older_than.filter(|days| *days > 0).map(AgeFilter::older_than_days);

        Ok(RunOptions {
            pattern,
            root,
            dry_run: self.dry_run,
            force: self.force,
            ignore_case: self.ignore_case,
            type_filter: type_filter.unwrap_or_default(),
            auto_exclude: !self.all,
            show_size: self.show_size,
            older_than,
            larger_than,
            empty_dirs: self.empty_dirs,
            max_display: self.max_display,
            ..RunOptions::default()
        })
    }
}

fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
    debug!("Logger initialized, verbose: {verbose}");
}

fn run(cli: Cli) -> Result<Outcome> {
    let interactive = cli.is_interactive();
    let mut options = cli.into_options()?;

    let mut display = Display::new(io::stdout(), options.show_size);
    let mut prompter = LinePrompter::new(io::stdin().lock(), io::stdout());

    if interactive {
        display.header()?;
        options.root = ask_search_root(&mut prompter, &mut display)?;
        options.pattern = ask_pattern(&mut prompter, &mut display)?;
        display.line("")?;
    }

    let elevated = is_elevated();
    debug!("Elevated: {elevated}, delegated search allowed: {}", options.use_fd);
    execute(&options, &PathClassifier::for_system(), elevated, &mut prompter, &mut display)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { exit_code::FAILURE } else { exit_code::SUCCESS };
            let _ = e.print();
            process::exit(code);
        },
    };

    init_logging(cli.verbose);
    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let code = match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("{}", e.user_message());
            e.exit_code()
        },
    };
    process::exit(code);
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use delf::types::TypeFilter;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_into_options() {
        let cli = Cli::parse_from([
            "delf", "*.log", "/var/log", "-n", "-i", "-t", "f", "-a", "--older-than", "7",
            "--larger-than", "10M",
        ]);
        assert!(!cli.is_interactive());
        let options = cli.into_options().unwrap();

        assert_eq!(options.pattern, "*.log");
        assert_eq!(options.root, PathBuf::from("/var/log"));
        assert!(options.dry_run && options.ignore_case && !options.force);
        assert_eq!(options.type_filter, TypeFilter::File);
        assert!(!options.auto_exclude);
        assert_eq!(options.older_than.map(|f| f.days()), Some(7));
        assert_eq!(options.larger_than.map(|f| f.bytes()), Some(10 * 1024 * 1024));
        assert_eq!(options.max_display, DEFAULT_MAX_DISPLAY);
    }

    #[test]
    fn test_zero_age_disables_filter() {
        let cli = Cli::parse_from(["delf", "*", "--older-than", "0"]);
        assert!(cli.into_options().unwrap().older_than.is_none());
    }

    #[test]
    fn test_invalid_arguments() {
        let cli = Cli::parse_from(["delf", "*", "-t", "x"]);
        assert_eq!(cli.into_options().unwrap_err().exit_code(), exit_code::FAILURE);
        let cli = Cli::parse_from(["delf", "*", "--larger-than", "lots"]);
        assert!(cli.into_options().is_err());
    }

    #[test]
    fn test_interactive_detection() {
        assert!(Cli::parse_from(["delf"]).is_interactive());
        assert!(!Cli::parse_from(["delf", "--empty-dirs"]).is_interactive());
    }

    #[test]
    fn test_empty_dirs_lone_positional_is_root() {
        let cli = Cli::parse_from(["delf", "--empty-dirs", "/srv/data"]);
        let options = cli.into_options().unwrap();
        assert_eq!(options.root, PathBuf::from("/srv/data"));
        assert!(options.pattern.is_empty());

        let options =
            Cli::parse_from(["delf", "--empty-dirs", "", "/srv/data"]).into_options().unwrap();
        assert_eq!(options.root, PathBuf::from("/srv/data"));

        let options = Cli::parse_from(["delf", "build", "/srv/data"]).into_options().unwrap();
        assert_eq!(options.root, PathBuf::from("/srv/data"));
        assert_eq!(options.pattern, "build");
    }
}
