use chrono::{DateTime, Duration, NaiveDate, Utc};

/// The single "now" a run is evaluated against.
///
/// Every overdue, due-soon, rolling-window and weekly calculation reads from
/// the same clock so one run is internally time-consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    now: DateTime<Utc>,
}

impl Clock {
    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn system() -> Self {
        Self { now: Utc::now() }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn days_from_today(&self, days: i64) -> NaiveDate {
        self.today() + Duration::days(days)
    }

    pub fn weeks_ago(&self, weeks: i64) -> DateTime<Utc> {
        self.now - Duration::weeks(weeks)
    }
}

/// Whole days from `from` to `to`, floored.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}
