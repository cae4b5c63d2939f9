//! Go-style duration strings (`"30s"`, `"1m30s"`, `"2.5s"`).
//!
//! Terraform configurations for this provider write durations the way Go's
//! `time.ParseDuration` accepts them, and state holds them the way Go's
//! `Duration.String` renders them. Keeping both directions identical avoids
//! perpetual diffs between config and state.

use std::fmt::Write as _;
use std::time::Duration;

use crate::error::{Error, Result};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "\u{b5}s" | "\u{3bc}s" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3_600 * NANOS_PER_SECOND),
        _ => None,
    }
}

/// Parse a Go duration string.
///
/// Negative durations are rejected; every attribute that carries a duration
/// requires a non-negative value.
///
/// # Errors
///
/// Returns [`Error::InvalidDuration`] for malformed input.
pub fn parse(attribute: &str, input: &str) -> Result<Duration> {
    let invalid = |reason: &str| Error::InvalidDuration {
        attribute: attribute.to_string(),
        value: input.to_string(),
        reason: reason.to_string(),
    };

    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest.starts_with('-') {
        return Err(invalid("negative durations are not supported"));
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("empty duration"));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_frac) = match after_int.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
                tail.split_at(frac_len)
            }
            None => ("", after_int),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("expected a number"));
        }

        let unit_len = after_frac
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_frac.len());
        let (unit, tail) = after_frac.split_at(unit_len);
        if unit.is_empty() {
            return Err(invalid("missing unit"));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(&format!("unknown unit {unit:?}")))?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid("number out of range"))?
        };
        let mut component = whole
            .checked_mul(scale)
            .ok_or_else(|| invalid("duration out of range"))?;
        if !frac_part.is_empty() {
            let digits = frac_part.get(..18).unwrap_or(frac_part);
            let numerator: u128 = digits.parse().map_err(|_| invalid("bad fraction"))?;
            let denominator = 10u128.pow(u32::try_from(digits.len()).unwrap_or(18));
            component += numerator * scale / denominator;
        }
        total = total
            .checked_add(component)
            .ok_or_else(|| invalid("duration out of range"))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| invalid("duration out of range"))?;
    let nanos = u32::try_from(total % NANOS_PER_SECOND).unwrap_or(0);
    Ok(Duration::new(secs, nanos))
}

/// Parse a duration and return whole seconds.
///
/// # Errors
///
/// Returns [`Error::InvalidDuration`] for malformed input.
pub fn parse_seconds(attribute: &str, input: &str) -> Result<u64> {
    Ok(parse(attribute, input)?.as_secs())
}

fn write_fraction(out: &mut String, value: u128, scale: u128) {
    let whole = value / scale;
    let frac = value % scale;
    let _ = write!(out, "{whole}");
    if frac != 0 {
        let width = scale.ilog10() as usize;
        let digits = format!("{frac:0width$}");
        let _ = write!(out, ".{}", digits.trim_end_matches('0'));
    }
}

/// Render a duration the way Go's `Duration.String` does.
#[must_use]
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    let mut out = String::new();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_SECOND {
        let (scale, unit) = if nanos < 1_000 {
            (1, "ns")
        } else if nanos < 1_000_000 {
            (1_000, "\u{b5}s")
        } else {
            (1_000_000, "ms")
        };
        write_fraction(&mut out, nanos, scale);
        out.push_str(unit);
        return out;
    }

    let total_secs = nanos / NANOS_PER_SECOND;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    write_fraction(&mut out, nanos % (60 * NANOS_PER_SECOND), NANOS_PER_SECOND);
    out.push('s');
    out
}

/// Render whole seconds as `"<n>s"`, the form the API-to-state mappers use
/// for periods, windows and reminders.
#[must_use]
pub fn seconds_string(seconds: u64) -> String {
    format!("{seconds}s")
}

/// Render float seconds (as the API stores check timeouts) at millisecond precision.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_f32_seconds(seconds: f32) -> String {
    let millis = (f64::from(seconds) * 1_000.0).round().max(0.0) as u64;
    format(Duration::from_millis(millis))
}

/// Parse and re-render a duration so equivalent spellings compare equal.
///
/// # Errors
///
/// Returns [`Error::InvalidDuration`] for malformed input.
pub fn normalize(attribute: &str, input: &str) -> Result<String> {
    parse(attribute, input).map(format)
}
