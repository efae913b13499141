use chrono::{Datelike, Duration, NaiveDate};

use super::{cycle_days, only_main, percent, Population};
use crate::output::{CycleTimeBucket, WeeklyEntry};

const WEEKS: i64 = 11;

const CYCLE_BUCKETS: [(&str, i64, i64); 5] = [
    ("0-3d", i64::MIN, 3),
    ("4-7d", 4, 7),
    ("8-14d", 8, 14),
    ("15-30d", 15, 30),
    ("30+d", 31, i64::MAX),
];

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// `YY-Www` from the ISO week of a Monday.
fn week_label(start: NaiveDate) -> String {
    let iso = start.iso_week();
    format!("{:02}-W{:02}", iso.year().rem_euclid(100), iso.week())
}

/// Eleven Monday-start weeks ending with the current one.
///
/// `open_end` is reconstructed backward from `total_open`: each earlier week
/// ends with the later week's value minus that later week's net
/// `created - closed`. There is no state history, so this assumes every
/// currently open row was open throughout.
pub(crate) fn weekly_data(pop: &Population, total_open: usize) -> Vec<WeeklyEntry> {
    let current = week_start(pop.today());
    let created_rows = only_main(&pop.active);
    let closed_rows = pop.main_closed();

    let mut weeks: Vec<WeeklyEntry> = (0..WEEKS)
        .map(|i| {
            let start = current - Duration::weeks(WEEKS - 1 - i);
            let end = start + Duration::weeks(1);
            let within = |date: NaiveDate| date >= start && date < end;
            WeeklyEntry {
                week: week_label(start),
                week_start: start,
                created: created_rows
                    .iter()
                    .filter(|r| r.created_at.is_some_and(|at| within(at.date_naive())))
                    .count(),
                closed: closed_rows
                    .iter()
                    .filter(|r| r.completed_at.is_some_and(|at| within(at.date_naive())))
                    .count(),
                open_end: 0,
            }
        })
        .collect();

    let mut open_end = total_open as i64;
    for entry in weeks.iter_mut().rev() {
        entry.open_end = open_end;
        open_end -= entry.created as i64 - entry.closed as i64;
    }
    weeks
}

/// Histogram of creation-to-completion days over main-team closed rows.
pub(crate) fn cycle_time_data(pop: &Population) -> Vec<CycleTimeBucket> {
    let days: Vec<i64> = pop
        .main_closed()
        .iter()
        .filter_map(|r| cycle_days(r))
        .collect();
    CYCLE_BUCKETS
        .iter()
        .map(|(range, low, high)| {
            let count = days.iter().filter(|d| (*low..=*high).contains(*d)).count();
            CycleTimeBucket {
                range: *range,
                count,
                pct: percent(count, days.len()).unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::clock::Clock;
    use crate::config::AnalyticsConfig;

    #[test]
    fn eleven_weeks_ending_this_monday() {
        let config = AnalyticsConfig::default();
        let population = Population::new(&[], Clock::fixed(now()), &config);
        let weeks = weekly_data(&population, 0);

        assert_eq!(weeks.len(), 11);
        let last = &weeks[10];
        assert_eq!(last.week_start, NaiveDate::from_ymd_opt(2026, 3, 16).unwrap());
        assert_eq!(last.week, "26-W12");
        assert_eq!(weeks[0].week_start, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(weeks[0].week, "26-W02");
        assert!(weeks
            .windows(2)
            .all(|pair| pair[1].week_start - pair[0].week_start == Duration::weeks(1)));
    }

    #[test]
    fn open_end_walks_backward_from_current_total() {
        let config = AnalyticsConfig::default();
        let mut created_now = row("A-1", "FCP", "Marta", "Todo");
        created_now.created_at = Some(days_ago(1));
        let mut created_too = row("A-2", "LTO", "Juan", "Backlog");
        created_too.created_at = Some(days_ago(0));
        let closed_last_week = closed_row("A-3", "RPA", "Ana", 30, 7);
        let mut pga = row("A-4", "PGA", "Juan", "Todo");
        pga.created_at = Some(days_ago(1));
        let rows = vec![created_now, created_too, closed_last_week, pga];
        let population = Population::new(&rows, Clock::fixed(now()), &config);
        let weeks = weekly_data(&population, 5);

        assert_eq!(weeks[10].created, 2);
        assert_eq!(weeks[10].closed, 0);
        assert_eq!(weeks[10].open_end, 5);
        assert_eq!(weeks[9].closed, 1);
        assert_eq!(weeks[9].open_end, 3);
        assert_eq!(weeks[8].open_end, 4);
        assert_eq!(weeks[6].created, 1);
        assert_eq!(weeks[5].open_end, 3);
    }

    #[test]
    fn cycle_time_buckets_and_shares() {
        let config = AnalyticsConfig::default();
        let rows = vec![
            closed_row("A-1", "FCP", "Marta", 3, 0),
            closed_row("A-2", "FCP", "Marta", 7, 3),
            closed_row("A-3", "FCP", "Marta", 10, 2),
            closed_row("A-4", "FCP", "Marta", 40, 0),
            closed_row("A-5", "PGA", "Marta", 40, 0),
            row("A-6", "FCP", "Marta", "Done"),
        ];
        let population = Population::new(&rows, Clock::fixed(now()), &config);
        let buckets = cycle_time_data(&population);
        let summary: Vec<(&str, usize, u32)> =
            buckets.iter().map(|b| (b.range, b.count, b.pct)).collect();

        assert_eq!(
            summary,
            vec![
                ("0-3d", 1, 25),
                ("4-7d", 1, 25),
                ("8-14d", 1, 25),
                ("15-30d", 0, 0),
                ("30+d", 1, 25),
            ]
        );
    }

    #[test]
    fn empty_histogram_reports_zero_shares() {
        let config = AnalyticsConfig::default();
        let population = Population::new(&[], Clock::fixed(now()), &config);
        let buckets = cycle_time_data(&population);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|b| b.count == 0 && b.pct == 0));
    }
}
