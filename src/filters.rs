//! Size and age predicates applied to matched entries

use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Parse a human size such as `500`, `10K`, `100M` or `2GB` into bytes
///
/// Units are binary (`1K` is 1024 bytes) and case-insensitive; a bare number
/// or a `B` suffix means bytes.
///
/// # Errors
/// Returns a validation error if the string is empty, the unit is unknown, or
/// the number is not a non-negative integer that fits in 64 bits once scaled.
pub fn parse_size(input: &str) -> Result<u64> {
    let upper = input.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(Error::validation("Size cannot be empty"));
    }

    let without_b = upper.strip_suffix('B').unwrap_or(&upper);
    let (digits, multiplier) = match without_b.chars().last() {
        Some('K') => (&without_b[..without_b.len() - 1], KIB),
        Some('M') => (&without_b[..without_b.len() - 1], MIB),
        Some('G') => (&without_b[..without_b.len() - 1], GIB),
        Some(c) if c.is_ascii_digit() => (without_b, 1),
        Some(c) => return Err(Error::validation(&format!("Invalid size unit: {c}"))),
        None => return Err(Error::validation(&format!("Invalid size: {input}"))),
    };

    let number: u64 = digits
        .trim()
        .parse()
        .map_err(|_| Error::validation(&format!("Invalid size number: {digits}")))?;

    number
        .checked_mul(multiplier)
        .ok_or_else(|| Error::validation(&format!("Size too large: {input}")))
}

/// Keeps files strictly larger than a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    min_exclusive: u64,
}

impl SizeFilter {
    /// Filter passing files larger than `bytes`
    #[must_use]
    pub const fn new(bytes: u64) -> Self {
        Self { min_exclusive: bytes }
    }

    /// Parse the threshold from a human size string
    ///
    /// # Errors
    /// See [`parse_size`].
    pub fn parse(input: &str) -> Result<Self> {
        parse_size(input).map(Self::new)
    }

    /// Threshold in bytes
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.min_exclusive
    }

    /// Whether an entry passes; directories are never size filtered
    #[must_use]
    pub const fn passes(&self, is_dir: bool, len: u64) -> bool {
        is_dir || len > self.min_exclusive
    }
}

/// Keeps entries last modified at least N days ago
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeFilter {
    days:   u64,
    cutoff: SystemTime,
}

impl AgeFilter {
    /// Filter relative to the current time
    #[must_use]
    pub fn older_than_days(days: u64) -> Self {
        Self::relative_to(days, SystemTime::now())
    }

    /// Filter relative to a fixed point in time
    #[must_use]
    pub fn relative_to(days: u64, now: SystemTime) -> Self {
        let age = Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY));
        let cutoff = now.checked_sub(age).unwrap_or(SystemTime::UNIX_EPOCH);
        Self { days, cutoff }
    }

    /// Threshold in days
    #[must_use]
    pub const fn days(&self) -> u64 {
        self.days
    }

    /// Whether an entry with the given modification time passes
    #[must_use]
    pub fn passes(&self, modified: SystemTime) -> bool {
        modified <= self.cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("500").unwrap(), 500);
        assert_eq!(parse_size("10K").unwrap(), 10 * 1024);
        assert_eq!(parse_size("10k").unwrap(), 10 * 1024);
        assert_eq!(parse_size("100M").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("2G").unwrap(), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("64B").unwrap(), 64);
        assert_eq!(parse_size(" 3mb ").unwrap(), 3 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(matches!(parse_size(""), Err(Error::Validation(_))));
        assert!(matches!(parse_size("10X"), Err(Error::Validation(_))));
        assert!(matches!(parse_size("M"), Err(Error::Validation(_))));
        assert!(matches!(parse_size("1.5G"), Err(Error::Validation(_))));
        assert!(matches!(parse_size("-4K"), Err(Error::Validation(_))));
        assert!(matches!(parse_size("99999999999999G"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_size_filter_strictly_greater() {
        let filter = SizeFilter::parse("1K").unwrap();
        assert!(!filter.passes(false, 1024));
        assert!(filter.passes(false, 1025));
        assert!(filter.passes(true, 0));
    }

    #[test]
    fn test_age_filter() {
        let now = SystemTime::now();
        let filter = AgeFilter::relative_to(7, now);
        let day = Duration::from_secs(SECONDS_PER_DAY);
        assert!(filter.passes(now - day * 8));
        assert!(!filter.passes(now - day * 6));
        assert!(!filter.passes(now));
        assert_eq!(filter.days(), 7);
    }

    #[test]
    fn test_age_filter_saturates() {
        let filter = AgeFilter::relative_to(u64::MAX, SystemTime::now());
        assert!(filter.passes(SystemTime::UNIX_EPOCH));
    }
}
