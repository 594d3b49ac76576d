//! Mission Time
//!
//! Telemetry times arrive as mission calendar strings (`YYYY:DDD:HH:MM:SS.sss`)
//! or, from the REST service, as compact digit strings (`YYYYDDDHHMMSSffffff`).
//! Everything downstream works in linear mission seconds: seconds elapsed since
//! `1998:001:00:00:00` UTC. Leap seconds are not applied.
//!
//! Never compare calendar strings directly; convert first.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Linear seconds since the mission epoch.
pub type MissionSeconds = f64;

/// Seconds in one hour, used for violation durations.
pub const SECS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Unrecognised time string: '{0}'")]
    Format(String),

    #[error("Time field out of range in '{0}'")]
    OutOfRange(String),
}

fn calendar_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}):(\d{3})(?::(\d{2})(?::(\d{2})(?::(\d{2})(\.\d*)?)?)?)?$")
            .expect("calendar pattern is valid")
    })
}

fn compact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})(\d{3})(\d{2})(\d{2})(\d{2})(\d*)$").expect("compact pattern is valid")
    })
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1998, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Assemble mission seconds from day-of-year calendar fields.
fn from_fields(
    raw: &str,
    year: i32,
    doy: u32,
    hour: u32,
    minute: u32,
    second: u32,
    fraction: f64,
) -> Result<MissionSeconds, TimeError> {
    if !YEAR_RANGE.contains(&year) {
        return Err(TimeError::OutOfRange(raw.to_string()));
    }
    let date = NaiveDate::from_yo_opt(year, doy).ok_or_else(|| TimeError::OutOfRange(raw.to_string()))?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| TimeError::OutOfRange(raw.to_string()))?;
    let elapsed = date.and_time(time) - epoch();
    Ok(elapsed.num_seconds() as f64 + fraction)
}

fn field(caps: &regex::Captures<'_>, idx: usize) -> u32 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Parse a mission calendar string.
///
/// Accepts truncated forms: `2023:044`, `2023:044:17`, `2023:044:17:41`,
/// `2023:044:17:41:07` and `2023:044:17:41:07.125`.
pub fn parse_calendar(s: &str) -> Result<MissionSeconds, TimeError> {
    let trimmed = s.trim();
    let caps = calendar_pattern()
        .captures(trimmed)
        .ok_or_else(|| TimeError::Format(s.to_string()))?;

    let year: i32 = caps[1].parse().map_err(|_| TimeError::Format(s.to_string()))?;
    let fraction = caps
        .get(6)
        .map(|m| m.as_str())
        .filter(|f| f.len() > 1)
        .and_then(|f| format!("0{f}").parse::<f64>().ok())
        .unwrap_or(0.0);

    from_fields(
        s,
        year,
        field(&caps, 2),
        field(&caps, 3),
        field(&caps, 4),
        field(&caps, 5),
        fraction,
    )
}

/// Parse the compact `YYYYDDDHHMMSSffffff` form used by the REST service.
///
/// The trailing fractional digits are optional and may be of any length.
pub fn parse_compact(s: &str) -> Result<MissionSeconds, TimeError> {
    let trimmed = s.trim();
    let caps = compact_pattern()
        .captures(trimmed)
        .ok_or_else(|| TimeError::Format(s.to_string()))?;

    let year: i32 = caps[1].parse().map_err(|_| TimeError::Format(s.to_string()))?;
    let fraction = match caps.get(6).map(|m| m.as_str()) {
        Some(digits) if !digits.is_empty() => format!("0.{digits}")
            .parse::<f64>()
            .map_err(|_| TimeError::Format(s.to_string()))?,
        _ => 0.0,
    };

    from_fields(
        s,
        year,
        field(&caps, 2),
        field(&caps, 3),
        field(&caps, 4),
        field(&caps, 5),
        fraction,
    )
}

/// Parse any accepted time representation: calendar string, compact string,
/// or a plain decimal number of mission seconds.
pub fn parse_time(s: &str) -> Result<MissionSeconds, TimeError> {
    let trimmed = s.trim();
    if trimmed.contains(':') {
        return parse_calendar(trimmed);
    }
    if compact_pattern().is_match(trimmed) && trimmed.len() >= 13 {
        return parse_compact(trimmed);
    }
    let secs = trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| TimeError::Format(s.to_string()))?;
    if checked_datetime(secs).is_none() {
        return Err(TimeError::OutOfRange(s.to_string()));
    }
    Ok(secs)
}

/// Calendar years a mission time may fall in; the calendar format has a
/// four-digit year.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Date-time of a mission time, or `None` outside `YEAR_RANGE`.
pub fn checked_datetime(secs: MissionSeconds) -> Option<NaiveDateTime> {
    // Bounds the f64 -> i64 cast well inside chrono's own limits
    if !secs.is_finite() || secs.abs() > 1.0e12 {
        return None;
    }
    let delta = Duration::try_milliseconds((secs * 1000.0).round() as i64)?;
    epoch()
        .checked_add_signed(delta)
        .filter(|dt| YEAR_RANGE.contains(&dt.year()))
}

/// UTC date-time of a mission time, to the millisecond.
///
/// Times outside `YEAR_RANGE` clamp to its first or last instant; NaN maps
/// to the epoch.
pub fn to_datetime(secs: MissionSeconds) -> NaiveDateTime {
    if let Some(dt) = checked_datetime(secs) {
        return dt;
    }
    let bound = |year: i32, ordinal: u32, time: NaiveTime| {
        NaiveDate::from_yo_opt(year, ordinal)
            .map(|d| d.and_time(time))
            .unwrap_or_else(epoch)
    };
    if secs.is_nan() {
        epoch()
    } else if secs < 0.0 {
        bound(*YEAR_RANGE.start(), 1, NaiveTime::MIN)
    } else {
        let last = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        bound(*YEAR_RANGE.end(), 365, last)
    }
}

/// Render mission seconds as `YYYY:DDD:HH:MM:SS.sss`.
pub fn format_calendar(secs: MissionSeconds) -> String {
    let dt = to_datetime(secs);
    format!(
        "{:04}:{:03}:{:02}:{:02}:{:02}.{:03}",
        dt.year(),
        dt.ordinal(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.nanosecond() / 1_000_000
    )
}

/// A closed mission time range `[start, stop]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: MissionSeconds,
    pub stop: MissionSeconds,
}

impl TimeRange {
    pub fn new(start: MissionSeconds, stop: MissionSeconds) -> Self {
        Self { start, stop }
    }

    /// Parse both ends from calendar strings.
    pub fn parse(start: &str, stop: &str) -> Result<Self, TimeError> {
        Ok(Self::new(parse_time(start)?, parse_time(stop)?))
    }

    /// True when `t` lies strictly inside the range.
    pub fn contains_strict(&self, t: MissionSeconds) -> bool {
        t > self.start && t < self.stop
    }

    pub fn contains(&self, t: MissionSeconds) -> bool {
        t >= self.start && t <= self.stop
    }

    pub fn start_calendar(&self) -> String {
        format_calendar(self.start)
    }

    pub fn stop_calendar(&self) -> String {
        format_calendar(self.stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_is_zero() {
        assert_eq!(parse_calendar("1998:001:00:00:00.000").unwrap(), 0.0);
    }

    #[test]
    fn test_ordering_by_linear_seconds() {
        let a = parse_calendar("2023:044:17:41:00").unwrap();
        let b = parse_calendar("2023:044:17:41:07").unwrap();
        assert!(a < b);
        assert!((b - a - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_calendar_forms() {
        let day = parse_calendar("2023:044").unwrap();
        let full = parse_calendar("2023:044:00:00:00.000").unwrap();
        assert_eq!(day, full);
        let hour = parse_calendar("2023:044:01").unwrap();
        assert!((hour - day - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_seconds() {
        let base = parse_calendar("2023:045:03:29:49").unwrap();
        let frac = parse_calendar("2023:045:03:29:49.010").unwrap();
        assert!((frac - base - 0.010).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_day_of_year() {
        assert!(matches!(
            parse_calendar("2023:366:00:00:00"),
            Err(TimeError::OutOfRange(_))
        ));
        assert!(parse_calendar("2024:366:00:00:00").is_ok());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(parse_calendar("yesterday"), Err(TimeError::Format(_))));
        assert!(parse_time("").is_err());
    }

    #[test]
    fn test_compact_matches_calendar() {
        let compact = parse_compact("2022296123045500000").unwrap();
        let calendar = parse_calendar("2022:296:12:30:45.500").unwrap();
        assert!((compact - calendar).abs() < 1e-6);

        let no_fraction = parse_compact("2022296123045").unwrap();
        assert!((no_fraction - parse_calendar("2022:296:12:30:45").unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_parse_time_dispatch() {
        assert_eq!(parse_time("12345.5").unwrap(), 12345.5);
        assert_eq!(
            parse_time("2023:044").unwrap(),
            parse_calendar("2023:044").unwrap()
        );
        assert_eq!(
            parse_time("2023044000000").unwrap(),
            parse_calendar("2023:044").unwrap()
        );
    }

    #[test]
    fn test_format_round_trip() {
        let s = "2023:048:03:56:31.086";
        assert_eq!(format_calendar(parse_calendar(s).unwrap()), s);
    }

    #[test]
    fn test_unrepresentable_seconds_rejected() {
        assert!(matches!(parse_time("1e300"), Err(TimeError::OutOfRange(_))));
        assert!(matches!(parse_time("-1e15"), Err(TimeError::OutOfRange(_))));
        assert!(matches!(parse_calendar("0000:001"), Err(TimeError::OutOfRange(_))));
        assert!(parse_time("9999:365:23:59:59").is_ok());
    }

    #[test]
    fn test_formatting_never_panics_out_of_range() {
        assert_eq!(format_calendar(1e300), "9999:365:23:59:59.999");
        assert_eq!(format_calendar(-1e300), "0001:001:00:00:00.000");
        assert_eq!(format_calendar(f64::NAN), "1998:001:00:00:00.000");
        assert_eq!(TimeRange::new(1e300, 2e300).start_calendar(), "9999:365:23:59:59.999");
    }

    #[test]
    fn test_time_range_strict_containment() {
        let range = TimeRange::parse("2023:044:17:41:00", "2023:055").unwrap();
        assert!(!range.contains_strict(range.start));
        assert!(range.contains(range.start));
        assert!(range.contains_strict(range.start + 1.0));
    }
}
