use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::aggregator::{DayStatus, DayView};

/// Proposed correction of a completed attendance record.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EditRequest {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 345)]
    pub attendance_id: u64,
    #[schema(example = "2026-01-05T09:00:00", format = "date-time", value_type = String)]
    pub requested_in_time: NaiveDateTime,
    #[schema(example = "2026-01-05T17:30:00", format = "date-time", value_type = String)]
    pub requested_out_time: NaiveDateTime,
    #[schema(example = "Forgot to check out")]
    pub reason: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = 2, nullable = true)]
    pub reviewed_by: Option<u64>,
    #[schema(example = "2026-01-06T08:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// A day can be corrected only once it is over and has a measured record.
pub fn can_request_edit(day: &DayView, today: NaiveDate) -> bool {
    day.attendance_id.is_some() && day.status == DayStatus::Completed && day.date < today
}

/// Checks the proposed times against the date of the record being edited.
pub fn validate_times(
    record_date: NaiveDate,
    in_time: NaiveDateTime,
    out_time: NaiveDateTime,
) -> Result<(), String> {
    if in_time.date() != record_date || out_time.date() != record_date {
        return Err(format!("Times must fall on {record_date}"));
    }
    if out_time < in_time {
        return Err("Check-out cannot be earlier than check-in".to_string());
    }
    Ok(())
}
