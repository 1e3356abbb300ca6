use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Stored status of an attendance record.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Leave,
    Holiday,
}

pub const DEFAULT_LOCATION: &str = "Office";

/// One employee's attendance for one calendar date.
///
/// `out_time` is never set without `in_time`, and is never earlier than it
/// for well-formed data. Readers must still tolerate violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub in_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub out_time: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub location: String,
}

impl AttendanceRecord {
    /// Only worked days carry times that an edit request may rewrite.
    pub fn accepts_time_edit(&self) -> bool {
        self.status == AttendanceStatus::Present
    }

    /// Why a check-in is refused when this record already exists for today.
    /// A worked day wins over its stored status.
    pub fn check_in_conflict(&self) -> &'static str {
        if self.in_time.is_some() {
            return "Already checked in today";
        }
        match self.status {
            AttendanceStatus::Leave => "On approved leave today",
            AttendanceStatus::Holiday => "Today is a holiday",
            AttendanceStatus::Absent => "Marked absent today, ask HR to correct the record",
            AttendanceStatus::Present => "Attendance for today already exists",
        }
    }
}

/// Raw `attendance` row; `status` is kept as text in the table.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub in_time: Option<NaiveDateTime>,
    pub out_time: Option<NaiveDateTime>,
    pub status: String,
    pub location: String,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let status = row.status.parse().unwrap_or_else(|_| {
            tracing::warn!(
                attendance_id = row.id,
                status = %row.status,
                "Unknown attendance status, treating as Present"
            );
            AttendanceStatus::default()
        });

        AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            in_time: row.in_time,
            out_time: row.out_time,
            status,
            location: row.location,
        }
    }
}
