use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Weekly recurring pickup slot of a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PickupSeries {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "store")]
    pub store_id: i64,
    pub start_date: DateTime<Utc>,
    pub description: String,
    pub last_changed_by: Option<i64>,
    pub last_changed_message: String,
}

impl PickupSeries {
    pub fn new(store_id: i64, start_date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            store_id,
            start_date,
            description: String::new(),
            last_changed_by: None,
            last_changed_message: String::new(),
        }
    }

    /// Weekly occurrences in `[from, until]`
    pub fn occurrences(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let week = Duration::weeks(1);
        let mut date = self.start_date;
        if date < from {
            let behind = (from - date).num_seconds();
            let weeks = behind / week.num_seconds();
            date += Duration::weeks(weeks);
            if date < from {
                date += week;
            }
        }

        let mut dates = Vec::new();
        while date <= until {
            dates.push(date);
            date += week;
        }
        dates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PickupDate {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "series")]
    pub series_id: Option<i64>,
    #[serde(rename = "store")]
    pub store_id: i64,
    pub date: DateTime<Utc>,
    pub description: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub last_changed_by: Option<i64>,
    pub last_changed_message: String,
}

impl PickupDate {
    pub fn new(store_id: i64, date: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            series_id: None,
            store_id,
            date,
            description: String::new(),
            cancelled_at: None,
            last_changed_by: None,
            last_changed_message: String::new(),
        }
    }

    pub fn for_series(series: &PickupSeries, date: DateTime<Utc>) -> Self {
        Self {
            series_id: Some(series.id),
            description: series.description.clone(),
            last_changed_by: series.last_changed_by,
            last_changed_message: series.last_changed_message.clone(),
            ..Self::new(series.store_id, date)
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn occurrences_start_at_first_date_after_from() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let series = PickupSeries::new(1, start);

        let from = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let until = from + Duration::weeks(2);
        let dates = series.occurrences(from, until);

        assert_eq!(
            dates,
            vec![
                Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn occurrences_of_future_series_start_at_start_date() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let start = from + Duration::days(3);
        let series = PickupSeries::new(1, start);

        let dates = series.occurrences(from, from + Duration::weeks(1));
        assert_eq!(dates, vec![start]);
    }
}
