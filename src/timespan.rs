use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// The pattern is constant so this is never `None`. The `Option` only keeps
// a panic path out of library code.
static DURATION: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(-?(?:\d+)?\.?\d+) *(milliseconds?|msecs?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w|years?|yrs?|y)?$",
    )
    .ok()
});

const SECOND: f64 = 1000.0;
const MINUTE: f64 = SECOND * 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

/// A relative time, either whole seconds or a duration string such as `"2 days"`, `"10h"` or `"1.5y"`.
///
/// A duration string without a unit counts milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timespan {
    Seconds(i64),
    Text(String),
}

impl Timespan {
    /// Adds this span to `timestamp` (seconds since the epoch).
    ///
    /// Returns `None` when the text cannot be parsed.
    pub fn resolve(&self, timestamp: i64) -> Option<i64> {
        match self {
            Timespan::Seconds(seconds) => timestamp.checked_add(*seconds),
            Timespan::Text(text) => {
                let millis = parse_millis(text)?;
                let resolved = (timestamp as f64 + millis / 1000.0).floor();
                resolved.is_finite().then_some(resolved as i64)
            }
        }
    }
}

fn parse_millis(text: &str) -> Option<f64> {
    if text.is_empty() || text.len() > 100 {
        return None;
    }
    let captures = DURATION.as_ref()?.captures(text)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2).map(|m| m.as_str().to_ascii_lowercase());
    let factor = match unit.as_deref().unwrap_or("ms") {
        "years" | "year" | "yrs" | "yr" | "y" => YEAR,
        "weeks" | "week" | "w" => WEEK,
        "days" | "day" | "d" => DAY,
        "hours" | "hour" | "hrs" | "hr" | "h" => HOUR,
        "minutes" | "minute" | "mins" | "min" | "m" => MINUTE,
        "seconds" | "second" | "secs" | "sec" | "s" => SECOND,
        _ => 1.0,
    };
    Some(value * factor)
}

impl From<i64> for Timespan {
    fn from(seconds: i64) -> Self {
        Timespan::Seconds(seconds)
    }
}

impl From<&str> for Timespan {
    fn from(text: &str) -> Self {
        Timespan::Text(text.to_owned())
    }
}

impl From<String> for Timespan {
    fn from(text: String) -> Self {
        Timespan::Text(text)
    }
}

impl From<std::time::Duration> for Timespan {
    fn from(duration: std::time::Duration) -> Self {
        Timespan::Seconds(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
    }
}
