use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Override marking a specific Saturday as a working day (or explicitly not).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkingSaturday {
    #[schema(example = "2025-03-08", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = true)]
    pub is_working: bool,
}

impl WorkingSaturday {
    /// Only Saturdays can be overridden.
    pub fn validate(&self) -> Result<(), String> {
        if self.date.weekday() != Weekday::Sat {
            return Err(format!("{} is a {}, not a Saturday", self.date, self.date.weekday()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_saturdays_only() {
        let saturday = WorkingSaturday {
            date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            is_working: true,
        };
        assert!(saturday.validate().is_ok());

        let friday = WorkingSaturday {
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            is_working: true,
        };
        assert!(friday.validate().is_err());
    }
}
