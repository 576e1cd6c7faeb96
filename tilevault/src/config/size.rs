//! Human-readable byte sizes such as `256MB`.

use thiserror::Error;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected bytes or a value like '256MB', '2GB', '512KB'")]
pub struct SizeParseError {
    input: String,
}

/// Parses a size in bytes, accepting `K`/`KB`, `M`/`MB` and `G`/`GB`
/// suffixes (powers of 1024, case-insensitive).
///
/// ```
/// use tilevault::config::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("256MB").unwrap(), 256 * 1024 * 1024);
/// assert_eq!(parse_size("1 g").unwrap(), 1024 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_uppercase();

    let (digits, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB)]
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|rest| (rest.trim().to_string(), *mult)))
        .unwrap_or_else(|| (upper.clone(), 1));

    let error = || SizeParseError {
        input: s.to_string(),
    };

    let value: usize = digits.parse().map_err(|_| error())?;
    value.checked_mul(multiplier).ok_or_else(error)
}

/// Formats a byte count with the largest exact unit.
pub fn format_size(bytes: usize) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}
