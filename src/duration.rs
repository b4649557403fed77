//! Video duration helpers
//!
//! The search API reports durations as ISO-8601 strings (`PT1H2M3S`);
//! the engine works in whole seconds.

use regex::Regex;

use crate::error::{Error, Result};

const ISO_DURATION_PATTERN: &str = r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$";

/// Parse an ISO-8601 duration (`P1DT2H3M4S`, `PT30M`, ...) into seconds
pub fn parse_iso8601_duration(text: &str) -> Result<u64> {
    let re = Regex::new(ISO_DURATION_PATTERN)
        .map_err(|e| Error::InvalidDuration(e.to_string()))?;
    let trimmed = text.trim();

    let caps = re
        .captures(trimmed)
        .ok_or_else(|| Error::InvalidDuration(trimmed.to_string()))?;

    let multipliers = [86_400u64, 3_600, 60, 1];
    let mut total = 0u64;
    let mut any_component = false;

    for (index, multiplier) in multipliers.iter().enumerate() {
        if let Some(value) = caps.get(index + 1) {
            let amount: u64 = value
                .as_str()
                .parse()
                .map_err(|_| Error::InvalidDuration(trimmed.to_string()))?;
            total = amount
                .checked_mul(*multiplier)
                .and_then(|seconds| total.checked_add(seconds))
                .ok_or_else(|| Error::InvalidDuration(trimmed.to_string()))?;
            any_component = true;
        }
    }

    if !any_component {
        return Err(Error::InvalidDuration(trimmed.to_string()));
    }

    Ok(total)
}

/// Format seconds as `M:SS` or `H:MM:SS`
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
