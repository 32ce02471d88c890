//! Human-readable byte sizes such as `256MB`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{0}' - expected format like '256MB', '1GB' or '1024KB'")]
pub struct SizeParseError(String);

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Parses a byte count with an optional `B`, `K[B]`, `M[B]` or `G[B]`
/// suffix, case-insensitively.
///
/// ```
/// use shapedit::config::parse_size;
///
/// assert_eq!(parse_size("512").unwrap(), 512);
/// assert_eq!(parse_size("64 mb").unwrap(), 64 * 1024 * 1024);
/// assert!(parse_size("1.5GB").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    let multiplier = match suffix.trim().to_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => KB,
        "M" | "MB" => MB,
        "G" | "GB" => GB,
        _ => return Err(SizeParseError(s.to_string())),
    };
    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError(s.to_string()))
}

/// Formats bytes with the largest suffix that divides them evenly.
pub fn format_size(bytes: usize) -> String {
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => b.to_string(),
    }
}
