//! Line-oriented operator input

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::display::Display;
use crate::error::{Error, Result};

/// Source of operator answers
pub trait Prompter {
    /// Show `prompt` and read one answer with surrounding whitespace removed
    ///
    /// End of input reads as an empty answer.
    ///
    /// # Errors
    /// Returns error if the prompt cannot be written or the input cannot be read.
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// [`Prompter`] over a reader and a writer, normally stdin and stdout
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    input:  R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Read answers from `input`, writing prompts to `output`
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_owned())
    }
}

/// Expand a leading `~` to `home` and `$VAR` / `${VAR}` references
///
/// Unknown variables expand to nothing. Without a home directory `~` is
/// left as typed.
pub fn expand_path<F>(input: &str, home: Option<&Path>, lookup: F) -> String
where
    F: Fn(&str) -> Option<OsString>,
{
    let var = |name: &str| {
        lookup(name).map(|v| v.to_string_lossy().into_owned()).unwrap_or_default()
    };

    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;
    let tilde = rest == "~" || rest.starts_with("~/") || rest.starts_with("~\\");
    if let Some(home) = home.filter(|_| tilde) {
        expanded.push_str(&home.to_string_lossy());
        rest = &rest[1..];
    }

    let mut chars = rest.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if ch != '$' {
            expanded.push(ch);
            continue;
        }
        let tail = &rest[i + 1..];
        if let Some(braced) = tail.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                let name = &braced[..end];
                expanded.push_str(&var(name));
                // `{` + name + `}`
                for _ in 0..name.chars().count() + 2 {
                    chars.next();
                }
                continue;
            }
        }
        let len =
            tail.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(tail.len());
        if len == 0 {
            expanded.push('$');
        } else {
            expanded.push_str(&var(&tail[..len]));
            for _ in 0..len {
                chars.next();
            }
        }
    }
    expanded
}

/// Ask for the directory to search
///
/// An empty answer means the current directory.
///
/// # Errors
/// Returns a validation error if the expanded answer is not an existing
/// directory, or the error of the prompter.
pub fn ask_search_root<P, W>(prompter: &mut P, display: &mut Display<W>) -> Result<PathBuf>
where
    P: Prompter + ?Sized,
    W: Write,
{
    display.line("Enter path to search (default: current directory):")?;
    let answer = prompter.read_line("> ")?;
    if answer.is_empty() {
        return Ok(PathBuf::from("."));
    }

    let home = dirs::home_dir();
    let expanded = expand_path(&answer, home.as_deref(), |name| std::env::var_os(name));
    let root = PathBuf::from(expanded);
    if !root.is_dir() {
        return Err(Error::validation(&format!(
            "Directory '{}' does not exist",
            root.display()
        )));
    }
    Ok(root)
}

/// Ask for the pattern to search for
///
/// # Errors
/// Returns a validation error if the answer is empty, or the error of the
/// prompter.
pub fn ask_pattern<P, W>(prompter: &mut P, display: &mut Display<W>) -> Result<String>
where
    P: Prompter + ?Sized,
    W: Write,
{
    display.line("Enter pattern to search (e.g. *.log, node_modules, *.tmp):")?;
    let answer = prompter.read_line("> ")?;
    if answer.is_empty() {
        return Err(Error::validation("Pattern cannot be empty"));
    }
    Ok(answer)
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::TempDir;

    use super::testing::ScriptedPrompter;
    use super::*;

    fn display() -> Display<Vec<u8>> {
        colored::control::set_override(false);
        Display::new(Vec::new(), false)
    }

    fn env(name: &str) -> Option<OsString> {
        match name {
            "HOME" => Some("/elsewhere".into()),
            "PROJ" => Some("work".into()),
            _ => None,
        }
    }

    fn expand(input: &str) -> String {
        expand_path(input, Some(Path::new("/home/me")), env)
    }

    #[test]
    fn test_line_prompter_trims_and_handles_eof() {
        let mut output = Vec::new();
        let mut prompter = LinePrompter::new(Cursor::new("  yes  \n"), &mut output);
        assert_eq!(prompter.read_line("Continue? ").unwrap(), "yes");
        assert_eq!(prompter.read_line("Again? ").unwrap(), "");
        drop(prompter);
        assert_eq!(String::from_utf8(output).unwrap(), "Continue? Again? ");
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand("~"), "/home/me");
        assert_eq!(expand("~/src"), "/home/me/src");
        assert_eq!(expand("/x/$PROJ/y"), "/x/work/y");
        assert_eq!(expand("/x/${PROJ}y"), "/x/worky");
        assert_eq!(expand("/x/$NOPE/y"), "/x//y");
        assert_eq!(expand("/cost/$"), "/cost/$");
        assert_eq!(expand("a~b"), "a~b");
    }

    #[test]
    fn test_tilde_without_home_is_kept() {
        assert_eq!(expand_path("~/src", None, env), "~/src");
        assert_eq!(expand_path("~", None, |_| None), "~");
    }

    #[test]
    fn test_ask_search_root() {
        let mut d = display();
        let mut prompter = ScriptedPrompter::new(&[""]);
        assert_eq!(ask_search_root(&mut prompter, &mut d).unwrap(), PathBuf::from("."));

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_string_lossy().into_owned();
        let mut prompter = ScriptedPrompter::new(&[&path]);
        assert_eq!(ask_search_root(&mut prompter, &mut d).unwrap(), temp_dir.path());

        let missing = temp_dir.path().join("missing").to_string_lossy().into_owned();
        let mut prompter = ScriptedPrompter::new(&[&missing]);
        assert!(matches!(ask_search_root(&mut prompter, &mut d), Err(Error::Validation(_))));
    }

    #[test]
    fn test_ask_pattern() {
        let mut d = display();
        let mut prompter = ScriptedPrompter::new(&["*.log"]);
        assert_eq!(ask_pattern(&mut prompter, &mut d).unwrap(), "*.log");

        let mut prompter = ScriptedPrompter::new(&["   "]);
        assert!(matches!(ask_pattern(&mut prompter, &mut d), Err(Error::Validation(_))));
    }
}
