//! Error types for `delf`

use arrayvec::ArrayString;
use thiserror::Error;

/// Maximum length of error messages
pub const MAX_ERROR_LENGTH: usize = 256;

/// Process exit codes
pub mod exit_code {
    /// Run completed, including dry runs and fully excluded sets
    pub const SUCCESS: i32 = 0;
    /// Nothing matched, or the input was invalid
    pub const FAILURE: i32 = 1;
    /// The operator declined a confirmation
    pub const CANCELLED: i32 = 2;
    /// The run needs administrator/root privileges before it can start
    pub const ELEVATION_REQUIRED: i32 = 3;
}

/// Custom result type for `delf` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for `delf`
///
/// # Design
/// - Messages built at runtime live in fixed `MAX_ERROR_LENGTH` buffers
/// - Longer messages are truncated at a character boundary
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid option, pattern or search root
    #[error("Error: {0}")]
    Validation(Box<ArrayString<MAX_ERROR_LENGTH>>),

    /// The search root is a protected system location
    #[error("Error: {0} is a protected system path")]
    ElevationRequired(Box<ArrayString<MAX_ERROR_LENGTH>>),
}

/// Copy `msg` into a fixed buffer, dropping whatever does not fit
fn bounded(msg: &str) -> Box<ArrayString<MAX_ERROR_LENGTH>> {
    let mut buf = ArrayString::new();
    for ch in msg.chars() {
        if buf.try_push(ch).is_err() {
            break;
        }
    }
    Box::new(buf)
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: &str) -> Self {
        Self::Validation(bounded(msg))
    }

    /// Create an elevation error for the given protected path
    pub fn elevation_required(path: &str) -> Self {
        Self::ElevationRequired(bounded(path))
    }

    /// Process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Validation(_) => exit_code::FAILURE,
            Self::ElevationRequired(_) => exit_code::ELEVATION_REQUIRED,
        }
    }

    /// Get a user-friendly error message with action items
    #[must_use]
    pub fn user_message(&self) -> ArrayString<MAX_ERROR_LENGTH> {
        let mut msg = ArrayString::new();
        let text = match self {
            Self::Io(e) => format!("ERROR: {e}\nTip: Check file permissions and try again"),
            Self::Validation(reason) => format!("ERROR: {reason}\nTip: Run with --help for usage"),
            Self::ElevationRequired(path) => format!(
                "ERROR: {path} is a protected system path\nTip: Re-run as Administrator/root to \
                 search it"
            ),
        };
        msg.push_str(&bounded(&text));
        msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::validation("bad").exit_code(), exit_code::FAILURE);
        assert_eq!(Error::elevation_required("/etc").exit_code(), exit_code::ELEVATION_REQUIRED);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(io).exit_code(), exit_code::FAILURE);
    }

    #[test]
    fn test_long_message_truncated() {
        let long = "é".repeat(MAX_ERROR_LENGTH);
        let Error::Validation(buf) = Error::validation(&long) else {
            panic!("expected validation error");
        };
        assert!(buf.len() <= MAX_ERROR_LENGTH);
        assert!(buf.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_user_message() {
        let msg = Error::validation("Pattern cannot be empty").user_message();
        assert!(msg.contains("Pattern cannot be empty"));
        assert!(msg.contains("--help"));
    }
}
