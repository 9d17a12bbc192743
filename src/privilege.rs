//! Detection of administrator/root privileges

/// Whether the current process runs with elevated privileges
#[cfg(unix)]
#[must_use]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Whether the current process runs with elevated privileges
///
/// `net session` only succeeds for members of the Administrators group.
#[cfg(windows)]
#[must_use]
pub fn is_elevated() -> bool {
    use std::process::{Command, Stdio};

    Command::new("net")
        .arg("session")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Whether the current process runs with elevated privileges
#[cfg(not(any(unix, windows)))]
#[must_use]
pub const fn is_elevated() -> bool {
    false
}
