//! CSV rendering of a day list.

use chrono::NaiveDateTime;

use crate::aggregator::DayView;

pub const CSV_HEADER: [&str; 7] = [
    "Date",
    "Status",
    "CheckIn",
    "CheckOut",
    "TotalHours",
    "Breaks",
    "Notes",
];

fn clock(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// One row per day; breaks are not tracked and always export as `0`.
pub fn days_to_csv(days: &[DayView]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for day in days {
        writer.write_record([
            day.date.format("%Y-%m-%d").to_string(),
            day.status.to_string(),
            clock(day.check_in),
            clock(day.check_out),
            day.total_hours.clone(),
            "0".to_string(),
            day.notes.clone().unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn export_filename(employee_id: u64, month: u32, year: i32) -> String {
    format!("attendance_{employee_id}_{year}-{month:02}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::DayStatus;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let days = vec![
            DayView {
                date: day(2),
                status: DayStatus::Weekend,
                check_in: None,
                check_out: None,
                total_hours: "0h 0m".to_string(),
                notes: Some("Sunday".to_string()),
                attendance_id: None,
                is_late: false,
            },
            DayView {
                date: day(3),
                status: DayStatus::Completed,
                check_in: day(3).and_hms_opt(9, 5, 0),
                check_out: day(3).and_hms_opt(17, 35, 0),
                total_hours: "8h 30m".to_string(),
                notes: None,
                attendance_id: Some(11),
                is_late: false,
            },
        ];

        let csv = String::from_utf8(days_to_csv(&days).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Date,Status,CheckIn,CheckOut,TotalHours,Breaks,Notes");
        assert_eq!(lines[1], "2025-03-02,weekend,,,0h 0m,0,Sunday");
        assert_eq!(lines[2], "2025-03-03,completed,09:05,17:35,8h 30m,0,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn notes_with_commas_are_quoted() {
        let days = vec![DayView {
            date: day(4),
            status: DayStatus::Absent,
            check_in: None,
            check_out: None,
            total_hours: "0h 0m".to_string(),
            notes: Some("On Leave, sick".to_string()),
            attendance_id: Some(1),
            is_late: false,
        }];

        let csv = String::from_utf8(days_to_csv(&days).unwrap()).unwrap();
        assert!(csv.ends_with("\"On Leave, sick\"\n"));
    }

    #[test]
    fn filename_pads_month() {
        assert_eq!(export_filename(5, 3, 2025), "attendance_5_2025-03.csv");
    }
}
