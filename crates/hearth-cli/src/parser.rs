use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_english::{parse_date_string, Dialect};
use hearth_core::models::{Frequency, Metadata};
use serde_json::Value;

/// Parses a calendar date, optionally with a time, as a naive local value.
///
/// ISO forms are tried first; anything else goes through chrono-english
/// ("tomorrow", "next monday", "in 3 days").
pub fn parse_date_time(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    parse_date_string(input, Local::now(), Dialect::Uk)
        .map(|dt| dt.naive_local())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Parses a time of day into `(hour, minute)`.
pub fn parse_clock_time(input: &str) -> Result<(i32, i32)> {
    let input = input.trim();
    let upper = input.to_uppercase();
    let time = ["%H:%M", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&upper, format).ok())
        .ok_or_else(|| anyhow!("Failed to parse time '{}': expected e.g. '16:00' or '7:30 PM'", input))?;
    Ok((time.hour() as i32, time.minute() as i32))
}

/// Parses a `--on` list.
///
/// Weekly patterns accept weekday names or indices (0 = Monday); monthly
/// ones accept days of month. Values are not range-checked: out-of-range
/// entries are stored and simply never match.
pub fn parse_by_day(input: &str, frequency: Frequency) -> Result<Vec<i32>> {
    let mut days = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let value = match part.parse::<i32>() {
            Ok(n) => n,
            Err(_) if frequency == Frequency::Weekly => weekday_index(part)
                .ok_or_else(|| anyhow!("Unknown weekday '{}'", part))?,
            Err(_) => return Err(anyhow!("Expected a day number, got '{}'", part)),
        };
        if !days.contains(&value) {
            days.push(value);
        }
    }
    if days.is_empty() {
        return Err(anyhow!("'{}' does not name any days", input));
    }
    Ok(days)
}

fn weekday_index(name: &str) -> Option<i32> {
    let index = match name.to_lowercase().as_str() {
        "mon" | "monday" | "mo" => 0,
        "tue" | "tues" | "tuesday" | "tu" => 1,
        "wed" | "wednesday" | "we" => 2,
        "thu" | "thur" | "thurs" | "thursday" | "th" => 3,
        "fri" | "friday" | "fr" => 4,
        "sat" | "saturday" | "sa" => 5,
        "sun" | "sunday" | "su" => 6,
        _ => return None,
    };
    Some(index)
}

/// Applies `key=value` pairs onto a metadata map. Values that parse as
/// JSON are stored as such; anything else becomes a string.
pub fn apply_metadata_pairs(metadata: &mut Metadata, pairs: &[String]) -> Result<()> {
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Metadata must look like key=value, got '{}'", pair))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Metadata key is empty in '{}'", pair));
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(())
}
