//! Bounded reads of sysfs descriptor files
//!
//! UIO exposes everything the harness needs as tiny ASCII files. Every read is
//! capped at [`DESCRIPTOR_READ_LIMIT`] bytes so a misbehaving attribute can't
//! stall discovery.

use crate::error::{Result, SynthError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Upper bound on bytes read from one descriptor file
pub const DESCRIPTOR_READ_LIMIT: usize = 128;

/// Radix of a numeric descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    /// Base 16, optional `0x` prefix (`addr`, `size`)
    Hex,
    /// Base 10 (`offset`); an explicit `0x` prefix switches to base 16
    Decimal,
}

/// Read at most `limit` bytes from `path`
fn read_bounded(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read a numeric descriptor
///
/// Returns `None` when the file is missing, unreadable or empty; callers treat
/// that as zero.
pub fn read_number(path: &Path, radix: Radix) -> Option<u64> {
    match read_bounded(path, DESCRIPTOR_READ_LIMIT) {
        Ok(bytes) if !bytes.is_empty() => {
            let value = parse_number(&String::from_utf8_lossy(&bytes), radix);
            tracing::debug!("{} = {value:#x}", path.display());
            Some(value)
        }
        Ok(_) => {
            tracing::debug!("{} is empty", path.display());
            None
        }
        Err(e) => {
            tracing::debug!("Cannot read {}: {e}", path.display());
            None
        }
    }
}

/// Read a name descriptor, stripping the trailing newline
///
/// `Ok(None)` means the file is missing, unreadable or empty.
///
/// # Errors
///
/// Returns `SynthError::DescriptorTooLong` if the content does not fit in
/// [`DESCRIPTOR_READ_LIMIT`] bytes.
pub fn read_name(path: &Path) -> Result<Option<String>> {
    // One byte past the limit tells a full-length name apart from a truncated one
    let Ok(bytes) = read_bounded(path, DESCRIPTOR_READ_LIMIT + 1) else {
        return Ok(None);
    };

    if bytes.is_empty() {
        return Ok(None);
    }

    if bytes.len() > DESCRIPTOR_READ_LIMIT {
        return Err(SynthError::DescriptorTooLong {
            path: path.to_path_buf(),
            limit: DESCRIPTOR_READ_LIMIT,
        });
    }

    let text = String::from_utf8_lossy(&bytes);
    let name = text.strip_suffix('\n').unwrap_or(&text);
    Ok(Some(name.to_string()))
}

/// Parse an unsigned integer the way `strtoul` does
///
/// Leading whitespace is skipped, digits are consumed up to the first
/// character that is not valid in the radix, and no digits at all yields 0.
/// Values past `u64::MAX` saturate.
pub fn parse_number(text: &str, radix: Radix) -> u64 {
    let text = text.trim_start();
    let prefixed = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"));

    let (digits, base) = match (radix, prefixed) {
        (_, Some(rest)) => (rest, 16),
        (Radix::Hex, None) => (text, 16),
        (Radix::Decimal, None) => (text, 10),
    };

    let mut value: u64 = 0;
    for c in digits.chars() {
        let Some(digit) = c.to_digit(base) else {
            break;
        };
        value = value
            .saturating_mul(u64::from(base))
            .saturating_add(u64::from(digit));
    }
    value
}
