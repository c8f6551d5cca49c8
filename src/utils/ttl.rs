//! Parsing of time-to-live expressions such as `10m`, `1h30m` or `1.5h`.
//!
//! Grammar: one or more `<number><unit>` groups; the number may carry a
//! decimal fraction. Units: `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`.
//! The total must be strictly positive.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TtlError {
    #[error("TTL is empty")]
    Empty,
    #[error("Invalid TTL '{0}'")]
    Invalid(String),
    #[error("Missing unit in TTL '{0}'")]
    MissingUnit(String),
    #[error("Unknown unit '{unit}' in TTL '{input}'")]
    UnknownUnit { unit: String, input: String },
    #[error("TTL must be positive, got '{0}'")]
    NotPositive(String),
    #[error("TTL '{0}' is too large")]
    Overflow(String),
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// Parses a TTL expression into a positive [`Duration`].
///
/// # Errors
///
/// Returns a [`TtlError`] describing the first problem found.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_ttl("10m")?, Duration::from_secs(600));
/// assert_eq!(parse_ttl("1h30m")?, Duration::from_secs(5_400));
/// assert!(parse_ttl("-5s").is_err());
/// ```
pub fn parse_ttl(input: &str) -> Result<Duration, TtlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TtlError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(TtlError::NotPositive(input.to_string()));
    }

    let overflow = || TtlError::Overflow(input.to_string());
    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut total: u128 = 0;

    if rest.is_empty() {
        return Err(TtlError::Invalid(input.to_string()));
    }

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(TtlError::Invalid(input.to_string()));
        }

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        if unit.is_empty() {
            return Err(TtlError::MissingUnit(input.to_string()));
        }
        let scale = unit_scale(unit).ok_or_else(|| TtlError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        if !fraction.is_empty() {
            let digits: u128 = fraction.parse().map_err(|_| overflow())?;
            let denominator = 10u128
                .checked_pow(fraction.len() as u32)
                .ok_or_else(overflow)?;
            let part = digits.checked_mul(scale).ok_or_else(overflow)? / denominator;
            nanos = nanos.checked_add(part).ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
    }

    if total == 0 {
        return Err(TtlError::NotPositive(input.to_string()));
    }

    let nanos = u64::try_from(total).map_err(|_| overflow())?;
    Ok(Duration::from_nanos(nanos))
}
