//! Attendance aggregation.
//!
//! Turns one employee's attendance records over a date range, plus the set of
//! working Saturdays, into a view of every calendar day and a summary of the
//! range. Everything here is a pure function of its inputs: "now" and the live
//! session are passed in, never read from the environment.

pub mod format;

#[cfg(test)]
mod tests;

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use format::{ZERO_HOURS, format_duration, format_minutes, parse_hours, worked_duration};

/// Check-ins strictly after this time of day count as late.
pub static LATE_AFTER: Lazy<NaiveTime> =
    Lazy::new(|| NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default());

/// Note the summary counts as a late day. Resolution never writes it, so
/// `late_days` is always zero while `is_late` carries the derived flag.
pub const LATE_ARRIVAL_NOTE: &str = "Late arrival";

pub const NOTE_SUNDAY: &str = "Sunday";
pub const NOTE_WEEKEND: &str = "Weekend";
pub const NOTE_ON_LEAVE: &str = "On Leave";
pub const NOTE_HOLIDAY: &str = "Holiday";

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayStatus {
    Weekend,
    Absent,
    Active,
    Completed,
}

/// Resolved attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: DayStatus,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    #[schema(example = "8h 30m")]
    pub total_hours: String,
    pub notes: Option<String>,
    /// Source record, needed to file an edit request against this day.
    pub attendance_id: Option<u64>,
    pub is_late: bool,
}

impl DayView {
    pub fn is_weekend(&self) -> bool {
        self.status == DayStatus::Weekend
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub total_days: u32,
    pub working_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub late_days: u32,
    #[schema(example = "168h 0m")]
    pub total_hours: String,
    /// Integer percentage of working days attended.
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Aggregation {
    pub days: Vec<DayView>,
    pub summary: MonthlySummary,
    /// Dates that had more than one record; the first record was used.
    #[serde(skip)]
    pub duplicate_dates: Vec<NaiveDate>,
}

/// Answers whether an employee has an open check-in for a date that is not
/// persisted yet, and since when.
pub trait LiveSessionReporter {
    fn open_check_in(&self, employee_id: u64, date: NaiveDate) -> Option<NaiveDateTime>;
}

/// Everything a range aggregation reads.
pub struct AggregateInput<'a> {
    pub employee_id: u64,
    pub records: &'a [AttendanceRecord],
    pub working_saturdays: &'a HashSet<NaiveDate>,
    pub live_session: Option<&'a dyn LiveSessionReporter>,
    pub now: NaiveDateTime,
}

/// First and last day of a month.
pub fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate), AggregateError> {
    if !(1..=12).contains(&month) {
        return Err(AggregateError::InvalidInput(format!("month must be 1-12, got {month}")));
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AggregateError::InvalidInput(format!("unsupported year {year}")))?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AggregateError::InvalidInput(format!("unsupported year {year}")))?;
    Ok((start, end))
}

/// Monday through Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate), AggregateError> {
    let out_of_range = || AggregateError::InvalidInput(format!("unsupported date {date}"));
    let monday = date
        .checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
        .ok_or_else(out_of_range)?;
    let sunday = monday
        .checked_add_signed(Duration::days(6))
        .ok_or_else(out_of_range)?;
    Ok((monday, sunday))
}

/// Aggregates one calendar month.
pub fn aggregate(
    input: &AggregateInput<'_>,
    month: u32,
    year: i32,
) -> Result<Aggregation, AggregateError> {
    let (start, end) = month_bounds(month, year)?;
    aggregate_range(input, start, end)
}

/// Aggregates every day in `[start, end]`.
pub fn aggregate_range(
    input: &AggregateInput<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Aggregation, AggregateError> {
    if input.employee_id == 0 {
        return Err(AggregateError::InvalidInput("employee id is required".into()));
    }
    if start > end {
        return Err(AggregateError::InvalidInput(format!(
            "range start {start} is after end {end}"
        )));
    }

    let today = input.now.date();
    let (by_date, duplicate_dates) = index_records(input.employee_id, input.records);

    let days: Vec<DayView> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| resolve_day(input, date, today, by_date.get(&date).copied()))
        .collect();

    let summary = summarize(&days, today);

    Ok(Aggregation {
        days,
        summary,
        duplicate_dates,
    })
}

/// First record per date wins; later ones are reported as duplicates.
fn index_records<'r>(
    employee_id: u64,
    records: &'r [AttendanceRecord],
) -> (HashMap<NaiveDate, &'r AttendanceRecord>, Vec<NaiveDate>) {
    let mut by_date = HashMap::with_capacity(records.len());
    let mut duplicates = BTreeSet::new();

    for record in records.iter().filter(|r| r.employee_id == employee_id) {
        if by_date.contains_key(&record.date) {
            duplicates.insert(record.date);
        } else {
            by_date.insert(record.date, record);
        }
    }

    (by_date, duplicates.into_iter().collect())
}

fn is_late(in_time: NaiveDateTime) -> bool {
    in_time.time() > *LATE_AFTER
}

fn blank_day(date: NaiveDate, status: DayStatus, note: Option<&str>) -> DayView {
    DayView {
        date,
        status,
        check_in: None,
        check_out: None,
        total_hours: ZERO_HOURS.to_string(),
        notes: note.map(str::to_string),
        attendance_id: None,
        is_late: false,
    }
}

fn resolve_day(
    input: &AggregateInput<'_>,
    date: NaiveDate,
    today: NaiveDate,
    record: Option<&AttendanceRecord>,
) -> DayView {
    match date.weekday() {
        Weekday::Sun => return blank_day(date, DayStatus::Weekend, Some(NOTE_SUNDAY)),
        Weekday::Sat if !input.working_saturdays.contains(&date) => {
            return blank_day(date, DayStatus::Weekend, Some(NOTE_WEEKEND));
        }
        _ => {}
    }

    let Some(record) = record else {
        let live = (date == today)
            .then(|| input.live_session)
            .flatten()
            .and_then(|live| live.open_check_in(input.employee_id, date));

        return match live {
            Some(started) => DayView {
                check_in: Some(started),
                is_late: is_late(started),
                ..blank_day(date, DayStatus::Active, None)
            },
            None => blank_day(date, DayStatus::Absent, None),
        };
    };

    let mut day = DayView {
        attendance_id: Some(record.id),
        ..blank_day(date, DayStatus::Absent, None)
    };

    match record.status {
        AttendanceStatus::Leave => day.notes = Some(NOTE_ON_LEAVE.to_string()),
        AttendanceStatus::Holiday => day.notes = Some(NOTE_HOLIDAY.to_string()),
        AttendanceStatus::Absent => {}
        AttendanceStatus::Present => match (record.in_time, record.out_time) {
            (None, _) => {}
            (Some(in_time), None) => {
                day.status = if date == today {
                    DayStatus::Active
                } else {
                    DayStatus::Completed
                };
                day.check_in = Some(in_time);
                day.is_late = is_late(in_time);
            }
            (Some(in_time), Some(out_time)) => {
                day.status = DayStatus::Completed;
                day.check_in = Some(in_time);
                day.check_out = Some(out_time);
                day.total_hours = format_duration(worked_duration(in_time, out_time));
                day.is_late = is_late(in_time);
            }
        },
    }

    day
}

/// Counters over already resolved days.
pub fn summarize(days: &[DayView], today: NaiveDate) -> MonthlySummary {
    let mut summary = MonthlySummary {
        total_days: days.len() as u32,
        working_days: 0,
        present_days: 0,
        absent_days: 0,
        late_days: 0,
        total_hours: ZERO_HOURS.to_string(),
        attendance_rate: 0,
    };
    let mut total_minutes = 0i64;

    for day in days {
        let elapsed = day.date <= today;

        if !day.is_weekend() && elapsed {
            summary.working_days += 1;
        }

        match day.status {
            DayStatus::Completed | DayStatus::Active => summary.present_days += 1,
            DayStatus::Absent if elapsed => summary.absent_days += 1,
            _ => {}
        }

        if day.notes.as_deref() == Some(LATE_ARRIVAL_NOTE) {
            summary.late_days += 1;
        }

        if day.status == DayStatus::Completed {
            total_minutes += parse_hours(&day.total_hours).unwrap_or(0);
        }
    }

    summary.total_hours = format_minutes(total_minutes);
    if summary.working_days > 0 {
        summary.attendance_rate =
            (summary.present_days as f64 / summary.working_days as f64 * 100.0).round() as u32;
    }

    summary
}
