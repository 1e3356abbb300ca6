use super::*;
use crate::model::attendance::DEFAULT_LOCATION;

const EMPLOYEE: u64 = 42;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).unwrap()
}

fn record(id: u64, day: NaiveDate, in_time: Option<(u32, u32)>, out_time: Option<(u32, u32)>) -> AttendanceRecord {
    AttendanceRecord {
        id,
        employee_id: EMPLOYEE,
        date: day,
        in_time: in_time.map(|(h, m)| at(day, h, m)),
        out_time: out_time.map(|(h, m)| at(day, h, m)),
        status: AttendanceStatus::Present,
        location: DEFAULT_LOCATION.to_string(),
    }
}

fn with_status(mut r: AttendanceRecord, status: AttendanceStatus) -> AttendanceRecord {
    r.status = status;
    r
}

fn input<'a>(
    records: &'a [AttendanceRecord],
    saturdays: &'a HashSet<NaiveDate>,
    now: NaiveDateTime,
) -> AggregateInput<'a> {
    AggregateInput {
        employee_id: EMPLOYEE,
        records,
        working_saturdays: saturdays,
        live_session: None,
        now,
    }
}

fn day_of(agg: &Aggregation, d: NaiveDate) -> &DayView {
    agg.days.iter().find(|v| v.date == d).unwrap()
}

struct FixedSession(Option<NaiveDateTime>);

impl LiveSessionReporter for FixedSession {
    fn open_check_in(&self, _employee_id: u64, _date: NaiveDate) -> Option<NaiveDateTime> {
        self.0
    }
}

#[test]
fn day_count_matches_calendar_month() {
    let saturdays = HashSet::new();
    let now = at(date(2025, 6, 15), 12, 0);
    let cases = [
        (1, 2024, 31),
        (2, 2024, 29),
        (2, 2025, 28),
        (4, 2025, 30),
        (12, 2025, 31),
    ];

    for (month, year, expected) in cases {
        let agg = aggregate(&input(&[], &saturdays, now), month, year).unwrap();
        assert_eq!(agg.days.len(), expected, "{year}-{month}");
        assert_eq!(agg.summary.total_days, expected as u32);
        assert_eq!(agg.days.first().unwrap().date, date(year, month, 1));
    }
}

#[test]
fn weekends_carry_no_times_or_hours() {
    // A stray record on a Sunday must not leak into the view.
    let sunday = date(2025, 3, 2);
    let records = vec![record(1, sunday, Some((9, 0)), Some((17, 0)))];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    for day in agg.days.iter().filter(|d| d.is_weekend()) {
        assert_eq!(day.total_hours, "0h 0m");
        assert!(day.check_in.is_none());
        assert!(day.check_out.is_none());
        assert!(day.attendance_id.is_none());
    }

    let sun = day_of(&agg, sunday);
    assert_eq!(sun.notes.as_deref(), Some("Sunday"));
    let sat = day_of(&agg, date(2025, 3, 1));
    assert_eq!(sat.status, DayStatus::Weekend);
    assert_eq!(sat.notes.as_deref(), Some("Weekend"));
}

#[test]
fn completed_day_reports_worked_hours() {
    let day = date(2025, 3, 4);
    let records = vec![record(9, day, Some((9, 0)), Some((17, 30)))];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 10), 8, 0)), 3, 2025).unwrap();

    let view = day_of(&agg, day);
    assert_eq!(view.status, DayStatus::Completed);
    assert_eq!(view.total_hours, "8h 30m");
    assert_eq!(view.attendance_id, Some(9));
    assert_eq!(view.check_in, Some(at(day, 9, 0)));
    assert_eq!(view.check_out, Some(at(day, 17, 30)));
    assert!(!view.is_late);
}

#[test]
fn corrupted_times_clamp_to_zero() {
    let day = date(2025, 3, 4);
    let records = vec![record(1, day, Some((17, 0)), Some((9, 0)))];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 10), 8, 0)), 3, 2025).unwrap();

    assert_eq!(day_of(&agg, day).total_hours, "0h 0m");
    assert_eq!(agg.summary.total_hours, "0h 0m");
}

#[test]
fn rate_is_zero_without_working_days() {
    let saturdays = HashSet::new();
    let sunday = date(2025, 3, 2);
    let agg = aggregate_range(&input(&[], &saturdays, at(sunday, 12, 0)), sunday, sunday).unwrap();

    assert_eq!(agg.summary.working_days, 0);
    assert_eq!(agg.summary.attendance_rate, 0);

    // Future-only range: nothing has elapsed yet.
    let monday = date(2025, 3, 3);
    let agg = aggregate_range(&input(&[], &saturdays, at(sunday, 12, 0)), monday, monday).unwrap();
    assert_eq!(agg.summary.working_days, 0);
    assert_eq!(agg.summary.absent_days, 0);
    assert_eq!(agg.summary.attendance_rate, 0);
}

#[test]
fn working_saturday_behaves_like_a_weekday() {
    let saturday = date(2025, 3, 8);
    let records = vec![record(5, saturday, Some((9, 0)), Some((13, 0)))];
    let now = at(date(2025, 3, 31), 18, 0);

    let mut working = HashSet::new();
    working.insert(saturday);
    let agg = aggregate(&input(&records, &working, now), 3, 2025).unwrap();
    let view = day_of(&agg, saturday);
    assert_eq!(view.status, DayStatus::Completed);
    assert_eq!(view.total_hours, "4h 0m");

    let off = HashSet::new();
    let baseline = aggregate(&input(&records, &off, now), 3, 2025).unwrap();
    let view = day_of(&baseline, saturday);
    assert_eq!(view.status, DayStatus::Weekend);
    assert_eq!(view.notes.as_deref(), Some("Weekend"));

    assert_eq!(agg.summary.working_days, baseline.summary.working_days + 1);
    assert_eq!(agg.summary.present_days, baseline.summary.present_days + 1);
}

#[test]
fn working_saturday_without_record_is_absent() {
    let saturday = date(2025, 3, 8);
    let mut working = HashSet::new();
    working.insert(saturday);
    let agg = aggregate(&input(&[], &working, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    assert_eq!(day_of(&agg, saturday).status, DayStatus::Absent);
}

#[test]
fn aggregation_is_idempotent() {
    let records = vec![
        record(1, date(2025, 3, 3), Some((8, 55)), Some((17, 5))),
        record(2, date(2025, 3, 4), Some((9, 45)), None),
        with_status(record(3, date(2025, 3, 5), None, None), AttendanceStatus::Leave),
    ];
    let saturdays = HashSet::new();
    let now = at(date(2025, 3, 12), 10, 0);

    let first = aggregate(&input(&records, &saturdays, now), 3, 2025).unwrap();
    let second = aggregate(&input(&records, &saturdays, now), 3, 2025).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn december_without_records_is_all_absent() {
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&[], &saturdays, at(date(2025, 12, 31), 23, 0)), 12, 2025).unwrap();

    for day in &agg.days {
        match day.date.weekday() {
            Weekday::Sat | Weekday::Sun => assert_eq!(day.status, DayStatus::Weekend),
            _ => assert_eq!(day.status, DayStatus::Absent),
        }
    }
    // December 2025 has 23 weekdays.
    assert_eq!(agg.summary.working_days, 23);
    assert_eq!(agg.summary.absent_days, 23);
    assert_eq!(agg.summary.present_days, 0);
    assert_eq!(agg.summary.attendance_rate, 0);
    assert_eq!(agg.summary.total_hours, "0h 0m");
}

#[test]
fn leave_holiday_and_absent_records_resolve_to_absent() {
    let records = vec![
        with_status(record(1, date(2025, 3, 3), None, None), AttendanceStatus::Leave),
        with_status(record(2, date(2025, 3, 4), None, None), AttendanceStatus::Holiday),
        with_status(record(3, date(2025, 3, 5), None, None), AttendanceStatus::Absent),
        record(4, date(2025, 3, 6), None, None),
    ];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    let leave = day_of(&agg, date(2025, 3, 3));
    assert_eq!(leave.status, DayStatus::Absent);
    assert_eq!(leave.notes.as_deref(), Some("On Leave"));
    assert_eq!(leave.attendance_id, Some(1));

    let holiday = day_of(&agg, date(2025, 3, 4));
    assert_eq!(holiday.status, DayStatus::Absent);
    assert_eq!(holiday.notes.as_deref(), Some("Holiday"));

    for d in [5, 6] {
        let view = day_of(&agg, date(2025, 3, d));
        assert_eq!(view.status, DayStatus::Absent);
        assert_eq!(view.notes, None);
    }
}

#[test]
fn open_record_is_active_today_and_completed_before() {
    let today = date(2025, 3, 12);
    let records = vec![
        record(1, date(2025, 3, 11), Some((9, 0)), None),
        record(2, today, Some((9, 0)), None),
    ];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(today, 11, 0)), 3, 2025).unwrap();

    let yesterday = day_of(&agg, date(2025, 3, 11));
    assert_eq!(yesterday.status, DayStatus::Completed);
    assert_eq!(yesterday.total_hours, "0h 0m");
    assert!(yesterday.check_out.is_none());

    let now = day_of(&agg, today);
    assert_eq!(now.status, DayStatus::Active);
    assert_eq!(now.check_in, Some(at(today, 9, 0)));
}

#[test]
fn live_session_only_applies_to_today() {
    let today = date(2025, 3, 12);
    let started = at(today, 9, 45);
    let saturdays = HashSet::new();
    let live = FixedSession(Some(started));

    let agg = aggregate(
        &AggregateInput {
            live_session: Some(&live),
            ..input(&[], &saturdays, at(today, 11, 0))
        },
        3,
        2025,
    )
    .unwrap();

    let view = day_of(&agg, today);
    assert_eq!(view.status, DayStatus::Active);
    assert_eq!(view.check_in, Some(started));
    assert!(view.is_late);
    assert_eq!(view.attendance_id, None);

    assert_eq!(day_of(&agg, date(2025, 3, 11)).status, DayStatus::Absent);
    assert_eq!(day_of(&agg, date(2025, 3, 13)).status, DayStatus::Absent);
}

#[test]
fn empty_live_session_leaves_today_absent() {
    let today = date(2025, 3, 12);
    let saturdays = HashSet::new();
    let live = FixedSession(None);
    let agg = aggregate(
        &AggregateInput {
            live_session: Some(&live),
            ..input(&[], &saturdays, at(today, 11, 0))
        },
        3,
        2025,
    )
    .unwrap();

    assert_eq!(day_of(&agg, today).status, DayStatus::Absent);
}

#[test]
fn late_flag_is_derived_but_never_counted() {
    let day = date(2025, 3, 4);
    let records = vec![record(1, day, Some((9, 31)), Some((18, 0)))];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    let view = day_of(&agg, day);
    assert!(view.is_late);
    assert_eq!(view.notes, None);
    assert_eq!(agg.summary.late_days, 0);
}

#[test]
fn check_in_at_threshold_is_on_time() {
    let day = date(2025, 3, 4);
    let records = vec![record(1, day, Some((9, 30)), Some((18, 0)))];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    assert!(!day_of(&agg, day).is_late);
}

#[test]
fn summary_counts_and_rate() {
    // March 2025, evaluated on Fri 7th: Mon 3 .. Fri 7 are the elapsed weekdays.
    let records = vec![
        record(1, date(2025, 3, 3), Some((9, 0)), Some((17, 30))),
        record(2, date(2025, 3, 4), Some((9, 0)), Some((17, 0))),
        with_status(record(3, date(2025, 3, 5), None, None), AttendanceStatus::Leave),
        record(4, date(2025, 3, 7), Some((8, 30)), None),
    ];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 7), 12, 0)), 3, 2025).unwrap();
    let s = &agg.summary;

    assert_eq!(s.total_days, 31);
    assert_eq!(s.working_days, 5);
    assert_eq!(s.present_days, 3);
    assert_eq!(s.absent_days, 2);
    assert_eq!(s.late_days, 0);
    assert_eq!(s.total_hours, "16h 30m");
    assert_eq!(s.attendance_rate, 60);
}

#[test]
fn duplicate_records_use_the_first_and_are_reported() {
    let day = date(2025, 3, 4);
    let records = vec![
        record(1, day, Some((9, 0)), Some((17, 0))),
        record(2, day, Some((10, 0)), Some((11, 0))),
    ];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    let view = day_of(&agg, day);
    assert_eq!(view.attendance_id, Some(1));
    assert_eq!(view.total_hours, "8h 0m");
    assert_eq!(agg.duplicate_dates, vec![day]);
}

#[test]
fn records_of_other_employees_are_ignored() {
    let day = date(2025, 3, 4);
    let mut foreign = record(1, day, Some((9, 0)), Some((17, 0)));
    foreign.employee_id = EMPLOYEE + 1;
    let records = vec![foreign];
    let saturdays = HashSet::new();
    let agg = aggregate(&input(&records, &saturdays, at(date(2025, 3, 31), 18, 0)), 3, 2025).unwrap();

    assert_eq!(day_of(&agg, day).status, DayStatus::Absent);
}

#[test]
fn invalid_input_is_rejected() {
    let saturdays = HashSet::new();
    let now = at(date(2025, 3, 31), 18, 0);

    assert!(matches!(
        aggregate(&input(&[], &saturdays, now), 0, 2025),
        Err(AggregateError::InvalidInput(_))
    ));
    assert!(matches!(
        aggregate(&input(&[], &saturdays, now), 13, 2025),
        Err(AggregateError::InvalidInput(_))
    ));

    let nobody = AggregateInput {
        employee_id: 0,
        ..input(&[], &saturdays, now)
    };
    assert!(aggregate(&nobody, 3, 2025).is_err());

    assert!(aggregate_range(&input(&[], &saturdays, now), date(2025, 3, 5), date(2025, 3, 4)).is_err());
}

#[test]
fn week_bounds_start_on_monday() {
    let (start, end) = week_bounds(date(2025, 3, 12)).unwrap();
    assert_eq!(start, date(2025, 3, 10));
    assert_eq!(end, date(2025, 3, 16));

    let (start, _) = week_bounds(date(2025, 3, 16)).unwrap();
    assert_eq!(start, date(2025, 3, 10));

    let saturdays = HashSet::new();
    let agg = aggregate_range(&input(&[], &saturdays, at(date(2025, 3, 12), 9, 0)), start, end).unwrap();
    assert_eq!(agg.days.len(), 7);
    assert_eq!(agg.days[0].date.weekday(), Weekday::Mon);
}

#[test]
fn week_spanning_a_month_boundary() {
    let (start, end) = week_bounds(date(2025, 4, 2)).unwrap();
    assert_eq!(start, date(2025, 3, 31));
    assert_eq!(end, date(2025, 4, 6));
}

#[test]
fn week_past_the_last_supported_date_is_invalid_input() {
    // Monday whose Sunday lies past the last representable date.
    let late: NaiveDate = serde_json::from_str("\"+262142-12-31\"").unwrap();
    assert_eq!(late.weekday(), Weekday::Mon);
    assert!(matches!(week_bounds(late), Err(AggregateError::InvalidInput(_))));
}
