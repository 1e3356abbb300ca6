use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

/// Review state shared by leave and edit requests.
///
/// `Pending` may move to `Approved` or `Rejected`; both are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, AsRefStr, EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn transition(self, next: RequestStatus) -> Result<RequestStatus, String> {
        match (self, next) {
            (RequestStatus::Pending, RequestStatus::Approved | RequestStatus::Rejected) => Ok(next),
            (from, to) => Err(format!("Request is already {from}, cannot mark it {to}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = "Flu", nullable = true)]
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Longest leave a single request may cover, both ends included.
pub const MAX_LEAVE_DAYS: i64 = 366;
/// How far back a request may start, for leave taken before it was filed.
pub const MAX_BACKDATE_DAYS: i64 = 30;

/// Checks a requested range against ordering, length and backdating limits.
pub fn validate_leave_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if start > end {
        return Err("start_date cannot be after end_date".into());
    }
    if end.signed_duration_since(start).num_days() + 1 > MAX_LEAVE_DAYS {
        return Err(format!("A leave request may cover at most {MAX_LEAVE_DAYS} days"));
    }
    if today.signed_duration_since(start).num_days() > MAX_BACKDATE_DAYS {
        return Err(format!(
            "start_date may be at most {MAX_BACKDATE_DAYS} days in the past"
        ));
    }
    Ok(())
}

/// Dates that receive a `Leave` attendance record once a request is approved.
/// Sundays never count; Saturdays are kept so a working Saturday is covered.
pub fn leave_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| d.weekday() != Weekday::Sun)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pending_moves_to_either_decision() {
        assert_eq!(
            RequestStatus::Pending.transition(RequestStatus::Approved),
            Ok(RequestStatus::Approved)
        );
        assert_eq!(
            RequestStatus::Pending.transition(RequestStatus::Rejected),
            Ok(RequestStatus::Rejected)
        );
    }

    #[test]
    fn decisions_are_final() {
        assert!(RequestStatus::Approved.transition(RequestStatus::Rejected).is_err());
        assert!(RequestStatus::Rejected.transition(RequestStatus::Approved).is_err());
        assert!(RequestStatus::Approved.transition(RequestStatus::Pending).is_err());
        assert!(RequestStatus::Pending.transition(RequestStatus::Pending).is_err());
    }

    #[test]
    fn status_parses_from_lowercase() {
        assert_eq!("approved".parse::<RequestStatus>().unwrap(), RequestStatus::Approved);
        assert_eq!(RequestStatus::Pending.as_ref(), "pending");
        assert_eq!(LeaveType::Sick.as_ref(), "sick");
    }

    #[test]
    fn leave_dates_skip_sundays_and_include_both_ends() {
        // Fri 2025-03-07 .. Mon 2025-03-10
        let dates = leave_dates(date(2025, 3, 7), date(2025, 3, 10));
        assert_eq!(dates, vec![date(2025, 3, 7), date(2025, 3, 8), date(2025, 3, 10)]);
    }

    #[test]
    fn leave_range_is_bounded() {
        let today = date(2025, 3, 10);
        assert!(validate_leave_range(date(2025, 3, 12), date(2025, 3, 11), today).is_err());

        // 366 days inclusive is the longest accepted span.
        let start = date(2025, 3, 10);
        let last_ok = start + chrono::Duration::days(MAX_LEAVE_DAYS - 1);
        assert!(validate_leave_range(start, last_ok, today).is_ok());
        assert!(validate_leave_range(start, last_ok.succ_opt().unwrap(), today).is_err());
        assert!(validate_leave_range(date(2000, 1, 1), date(2999, 12, 31), today).is_err());

        assert!(validate_leave_range(date(2025, 2, 8), date(2025, 2, 8), today).is_ok());
        assert!(validate_leave_range(date(2025, 2, 7), date(2025, 2, 7), today).is_err());
    }

    #[test]
    fn single_day_leave() {
        assert_eq!(leave_dates(date(2025, 3, 5), date(2025, 3, 5)), vec![date(2025, 3, 5)]);
    }
}
