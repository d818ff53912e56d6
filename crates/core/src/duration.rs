//! Prometheus-style duration strings (`30s`, `5m`, `1h30m`, `2d`).
//!
//! Grafana accepts the same grammar for rule `for` and group `interval`
//! fields, so both the runtime config and the generated-rule validator share
//! this parser.

use std::time::Duration;

use crate::error::{AlertgenError, Result};

/// Parse a compound duration made of `<integer><unit>` terms.
///
/// Units, largest to smallest: `y`, `w`, `d`, `h`, `m`, `s`, `ms`. Each unit
/// may appear at most once and units must be in descending order, matching
/// what Prometheus accepts.
pub fn parse_duration(input: &str) -> Result<Duration> {
    const UNITS: &[(&str, u64)] = &[
        ("y", 365 * 24 * 3600 * 1000),
        ("w", 7 * 24 * 3600 * 1000),
        ("d", 24 * 3600 * 1000),
        ("h", 3600 * 1000),
        ("m", 60 * 1000),
        ("s", 1000),
        ("ms", 1),
    ];

    let invalid = || AlertgenError::InvalidDuration(input.to_string());

    if input.is_empty() {
        return Err(invalid());
    }

    let mut rest = input;
    let mut total_ms: u64 = 0;
    // Index into UNITS of the last unit consumed; the next one must be smaller.
    let mut last_unit: Option<usize> = None;

    while !rest.is_empty() {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let idx = UNITS
            .iter()
            .position(|(name, _)| *name == unit)
            .ok_or_else(invalid)?;
        if matches!(last_unit, Some(prev) if idx <= prev) {
            return Err(invalid());
        }
        last_unit = Some(idx);

        let ms = value.checked_mul(UNITS[idx].1).ok_or_else(invalid)?;
        total_ms = total_ms.checked_add(ms).ok_or_else(invalid)?;
    }

    Ok(Duration::from_millis(total_ms))
}
