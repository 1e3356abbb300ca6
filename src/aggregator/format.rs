//! `"{H}h {M}m"` duration strings used by day views and summaries.

use chrono::{Duration, NaiveDateTime};

pub const ZERO_HOURS: &str = "0h 0m";

/// Time between check-in and check-out, never negative.
pub fn worked_duration(in_time: NaiveDateTime, out_time: NaiveDateTime) -> Duration {
    let worked = out_time - in_time;
    if worked < Duration::zero() {
        Duration::zero()
    } else {
        worked
    }
}

/// Whole hours, then the remaining fraction rounded to minutes.
/// A remainder that rounds up to 60 minutes carries into the hour.
pub fn format_duration(duration: Duration) -> String {
    let hours = duration.num_seconds().max(0) as f64 / 3600.0;
    let mut h = hours.floor() as i64;
    let mut m = ((hours - h as f64) * 60.0).round() as i64;
    if m >= 60 {
        h += 1;
        m -= 60;
    }
    format!("{h}h {m}m")
}

pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Reads a formatted duration back as minutes.
pub fn parse_hours(value: &str) -> Option<i64> {
    let (h, rest) = value.trim().split_once('h')?;
    let m = rest.trim().strip_suffix('m')?;
    let h: i64 = h.trim().parse().ok()?;
    let m: i64 = m.trim().parse().ok()?;
    Some(h * 60 + m)
}
