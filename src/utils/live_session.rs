use chrono::{NaiveDate, NaiveDateTime};
use moka::sync::Cache;
use std::time::Duration;

use crate::aggregator::LiveSessionReporter;

/// Open check-ins keyed by `(employee_id, date)`.
///
/// Filled on check-in and cleared on check-out, so "today" can show as active
/// even when the persisted record is not visible yet.
#[derive(Clone)]
pub struct LiveSessionCache {
    sessions: Cache<(u64, NaiveDate), NaiveDateTime>,
}

impl LiveSessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(100_000) // one entry per checked-in employee
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn start(&self, employee_id: u64, started_at: NaiveDateTime) {
        self.sessions
            .insert((employee_id, started_at.date()), started_at);
    }

    pub fn finish(&self, employee_id: u64, date: NaiveDate) {
        self.sessions.invalidate(&(employee_id, date));
    }
}

impl LiveSessionReporter for LiveSessionCache {
    fn open_check_in(&self, employee_id: u64, date: NaiveDate) -> Option<NaiveDateTime> {
        self.sessions.get(&(employee_id, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn reports_started_session_for_its_date_only() {
        let cache = LiveSessionCache::new(Duration::from_secs(60));
        cache.start(7, at(4, 9));

        assert_eq!(cache.open_check_in(7, at(4, 0).date()), Some(at(4, 9)));
        assert_eq!(cache.open_check_in(7, at(5, 0).date()), None);
        assert_eq!(cache.open_check_in(8, at(4, 0).date()), None);
    }

    #[test]
    fn finish_clears_the_session() {
        let cache = LiveSessionCache::new(Duration::from_secs(60));
        cache.start(7, at(4, 9));
        cache.finish(7, at(4, 0).date());

        assert_eq!(cache.open_check_in(7, at(4, 0).date()), None);
    }
}
