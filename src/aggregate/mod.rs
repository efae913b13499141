//! Aggregation engine: turns normalized rows into the [`AnalyticsModel`].
//!
//! Every view is computed from a shared, read-only [`Population`] so the
//! same exclusion rules apply to all of them.

mod detail;
mod okr;
mod quality;
mod summary;
mod trends;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::classify::Classifier;
use crate::clock::{days_between, Clock};
use crate::config::AnalyticsConfig;
use crate::models::{is_main_team, is_reported_team, Priority, RawIssue, Row, ShirtSize, PGA};
use crate::normalize::normalize;
use crate::output::{
    AnalyticsModel, IssueRef, OverdueIssue, PriorityCount, ShirtSizeCount, StatusCount,
};

pub use okr::{completion_percent, status_for_completion};

/// Canonical order for status charts; statuses not listed follow in
/// first-seen order.
const STATUS_ORDER: [&str; 8] = [
    "Backlog",
    "In Progress",
    "Ongoing",
    "On Hold",
    "Todo",
    "In Review",
    "Pending Signature",
    "Triage",
];

/// Builds the analytics model with the default tables.
pub fn build_analytics(issues: &[RawIssue], now: DateTime<Utc>) -> AnalyticsModel {
    build_analytics_with(issues, Clock::fixed(now), &AnalyticsConfig::default())
}

pub fn build_analytics_with(
    issues: &[RawIssue],
    clock: Clock,
    config: &AnalyticsConfig,
) -> AnalyticsModel {
    let rows: Vec<Row> = issues.iter().map(|raw| normalize(raw, config)).collect();
    let population = Population::new(&rows, clock, config);
    info!(
        issues = rows.len(),
        active = population.active.len(),
        excluded = rows.len() - population.active.len(),
        now = %clock.now(),
        "Building analytics model"
    );

    let summary_stats = summary::build_summary(&population);
    let okr = okr::build_okr_rollup(&population);
    let weekly_data = trends::weekly_data(&population, summary_stats.total_open);
    let cycle_time_data = trends::cycle_time_data(&population);
    let (quality_data, data_quality_issues) = quality::build_quality(&population);
    debug!(
        open = summary_stats.total_open,
        closed = summary_stats.total_closed,
        dkrs = okr.dkr_count(),
        "Aggregation complete"
    );

    AnalyticsModel {
        team_detailed_data: detail::team_detailed_data(&population),
        assignee_detailed_data: detail::assignee_detailed_data(&population),
        performance_data: detail::performance_data(&population),
        quality_data,
        data_quality_issues,
        weekly_data,
        cycle_time_data,
        deleted_issue_ids: population.excluded_ids(),
        issues_by_status: summary::issues_by_status(&population),
        issues_by_priority: summary::issues_by_priority(&population),
        issues_by_shirt_size: issues_by_shirt_size(&population.reported_open()),
        okrs_data_by_team: okr.okrs_by_team,
        dkr_summary_by_team: okr.dkr_summary_by_team,
        issues_by_okr: okr.issues_by_okr,
        canceled_issues: population.canceled.iter().map(|r| issue_ref(r, false)).collect(),
        duplicated_issues: population
            .duplicated
            .iter()
            .map(|r| issue_ref(r, false))
            .collect(),
        summary_stats,
    }
}

/// Filtered views over one run's rows.
///
/// `active` excludes eliminated and unassigned rows. `open`, `closed`,
/// `overdue` and `due_soon` are subsets of `active` under the default
/// taxonomy. `canceled` and `duplicated` come from the unfiltered rows,
/// limited to reported teams.
pub(crate) struct Population<'a> {
    pub clock: Clock,
    pub classifier: Classifier<'a>,
    pub config: &'a AnalyticsConfig,
    pub rows: &'a [Row],
    pub active: Vec<&'a Row>,
    pub open: Vec<&'a Row>,
    pub closed: Vec<&'a Row>,
    pub overdue: Vec<&'a Row>,
    pub due_soon: Vec<&'a Row>,
    pub canceled: Vec<&'a Row>,
    pub duplicated: Vec<&'a Row>,
}

impl<'a> Population<'a> {
    pub fn new(rows: &'a [Row], clock: Clock, config: &'a AnalyticsConfig) -> Self {
        let classifier = Classifier::new(config);
        let today = clock.today();
        let horizon = clock.days_from_today(7);

        let active: Vec<&Row> = rows.iter().filter(|r| classifier.is_active(r)).collect();
        let open: Vec<&Row> = active
            .iter()
            .copied()
            .filter(|r| classifier.is_open_default(&r.state))
            .collect();
        let closed = active
            .iter()
            .copied()
            .filter(|r| classifier.is_closed_default(&r.state))
            .collect();
        let overdue = open
            .iter()
            .copied()
            .filter(|r| r.due_date.is_some_and(|due| due < today))
            .collect();
        let due_soon = open
            .iter()
            .copied()
            .filter(|r| r.due_date.is_some_and(|due| due >= today && due <= horizon))
            .collect();
        let canceled = rows
            .iter()
            .filter(|r| classifier.is_canceled(r) && is_reported_team(&r.dashboard_team))
            .collect();
        let duplicated = rows
            .iter()
            .filter(|r| classifier.is_duplicate(r) && is_reported_team(&r.dashboard_team))
            .collect();

        Self {
            clock,
            classifier,
            config,
            rows,
            active,
            open,
            closed,
            overdue,
            due_soon,
            canceled,
            duplicated,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Open rows in any reported team (the four main teams plus PGA).
    pub fn reported_open(&self) -> Vec<&'a Row> {
        only_reported(&self.open)
    }

    pub fn main_open(&self) -> Vec<&'a Row> {
        only_main(&self.open)
    }

    pub fn main_closed(&self) -> Vec<&'a Row> {
        only_main(&self.closed)
    }

    pub fn has_active_in(&self, team: &str) -> bool {
        self.active.iter().any(|r| r.dashboard_team == team)
    }

    pub fn has_pga(&self) -> bool {
        self.has_active_in(PGA)
    }

    /// Ids of every row kept out of the metrics: trashed, eliminated or
    /// unassigned.
    pub fn excluded_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| !self.classifier.is_active(r))
            .map(|r| r.id.clone())
            .collect()
    }
}

pub(crate) fn only_reported<'a>(rows: &[&'a Row]) -> Vec<&'a Row> {
    rows.iter()
        .copied()
        .filter(|r| is_reported_team(&r.dashboard_team))
        .collect()
}

pub(crate) fn only_main<'a>(rows: &[&'a Row]) -> Vec<&'a Row> {
    rows.iter()
        .copied()
        .filter(|r| is_main_team(&r.dashboard_team))
        .collect()
}

pub(crate) fn in_team<'a>(rows: &[&'a Row], team: &str) -> Vec<&'a Row> {
    rows.iter()
        .copied()
        .filter(|r| r.dashboard_team == team)
        .collect()
}

pub(crate) fn for_assignee<'a>(rows: &[&'a Row], assignee: &str) -> Vec<&'a Row> {
    rows.iter()
        .copied()
        .filter(|r| r.assignee == assignee)
        .collect()
}

/// Distinct assignees in first-seen order.
pub(crate) fn assignees_in_order<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        if !row.is_unassigned() && !seen.contains(&row.assignee) {
            seen.push(row.assignee.clone());
        }
    }
    seen
}

pub(crate) fn issue_ref(row: &Row, with_state: bool) -> IssueRef {
    IssueRef {
        id: row.id.clone(),
        title: row.title.clone(),
        team: row.dashboard_team.clone(),
        assignee: row.assignee.clone(),
        priority: row.priority,
        url: row.url.clone(),
        state: with_state.then(|| row.state.clone()),
    }
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Rounded percentage; `None` when there is nothing to divide by.
pub(crate) fn percent(part: usize, whole: usize) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    Some(((part as f64 / whole as f64) * 100.0).round() as u32)
}

pub(crate) fn cycle_days(row: &Row) -> Option<i64> {
    match (row.created_at, row.completed_at) {
        (Some(created), Some(completed)) => Some(days_between(created, completed)),
        _ => None,
    }
}

/// Mean creation-to-completion days over rows carrying both timestamps.
pub(crate) fn average_cycle_days(rows: &[&Row], places: i32) -> Option<f64> {
    let days: Vec<i64> = rows.iter().filter_map(|r| cycle_days(r)).collect();
    if days.is_empty() {
        return None;
    }
    let total: i64 = days.iter().sum();
    Some(round_to(total as f64 / days.len() as f64, places))
}

pub(crate) struct SlaOutcome {
    pub with_due_date: usize,
    pub on_time: usize,
    pub compliance: Option<u32>,
}

/// Closed rows with a due date that completed on or before it (date part).
pub(crate) fn sla_outcome(closed: &[&Row]) -> SlaOutcome {
    let judged: Vec<(NaiveDate, NaiveDate)> = closed
        .iter()
        .filter_map(|r| Some((r.completed_at?.date_naive(), r.due_date?)))
        .collect();
    let on_time = judged.iter().filter(|(done, due)| done <= due).count();
    SlaOutcome {
        with_due_date: judged.len(),
        on_time,
        compliance: percent(on_time, judged.len()),
    }
}

pub(crate) fn completed_since(rows: &[&Row], cutoff: DateTime<Utc>) -> usize {
    rows.iter()
        .filter(|r| r.completed_at.is_some_and(|done| done >= cutoff))
        .count()
}

pub(crate) fn status_counts(rows: &[&Row]) -> Vec<StatusCount> {
    let mut counts: Vec<StatusCount> = Vec::new();
    for row in rows {
        match counts.iter_mut().find(|c| c.status == row.state) {
            Some(entry) => entry.count += 1,
            None => counts.push(StatusCount {
                status: row.state.clone(),
                count: 1,
            }),
        }
    }
    let rank = |status: &str| {
        STATUS_ORDER
            .iter()
            .position(|s| *s == status)
            .unwrap_or(STATUS_ORDER.len())
    };
    counts.sort_by_key(|c| rank(&c.status));
    counts
}

/// One entry per priority, always all five, in chart order.
pub(crate) fn priority_counts(rows: &[&Row]) -> Vec<PriorityCount> {
    Priority::ORDER
        .iter()
        .map(|priority| PriorityCount {
            priority: *priority,
            count: rows.iter().filter(|r| r.priority == *priority).count(),
        })
        .collect()
}

/// Open issues grouped by shirt size; every size has an entry.
pub(crate) fn issues_by_shirt_size(rows: &[&Row]) -> BTreeMap<ShirtSize, Vec<IssueRef>> {
    ShirtSize::ALL
        .iter()
        .map(|size| {
            let issues = rows
                .iter()
                .filter(|r| r.shirt_size == *size)
                .map(|r| issue_ref(r, true))
                .collect();
            (*size, issues)
        })
        .collect()
}

/// Non-empty size counts read off the drill-down lists.
pub(crate) fn shirt_counts_from(
    issues: &BTreeMap<ShirtSize, Vec<IssueRef>>,
) -> Vec<ShirtSizeCount> {
    issues
        .iter()
        .filter(|(_, list)| !list.is_empty())
        .map(|(size, list)| ShirtSizeCount {
            size: *size,
            count: list.len(),
            weight: None,
        })
        .collect()
}

pub(crate) fn weighted_load(rows: &[&Row]) -> u32 {
    rows.iter().map(|r| r.shirt_size.weight()).sum()
}

/// Overdue entries, most overdue first.
pub(crate) fn overdue_issues(rows: &[&Row], today: NaiveDate) -> Vec<OverdueIssue> {
    let mut issues: Vec<OverdueIssue> = rows
        .iter()
        .filter_map(|r| {
            let due = r.due_date?;
            Some(OverdueIssue {
                id: r.id.clone(),
                title: r.title.clone(),
                team: r.dashboard_team.clone(),
                due_date: due,
                days_overdue: (today - due).num_days(),
                assignee: r.assignee.clone(),
                priority: r.priority,
                url: r.url.clone(),
            })
        })
        .collect();
    issues.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
    issues
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use crate::models::{ChildRow, Priority, Row, ShirtSize};

    pub fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2026, 3, 18, 12, 0, 0).unwrap()
    }

    pub fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    pub fn date_in(days: i64) -> NaiveDate {
        now().date_naive() + Duration::days(days)
    }

    pub fn row(id: &str, team: &str, assignee: &str, state: &str) -> Row {
        Row {
            id: id.to_string(),
            title: format!("Issue {id}"),
            url: format!("https://linear.app/roxom/issue/{id}"),
            team: team.to_string(),
            dashboard_team: team.to_string(),
            group: None,
            assignee: assignee.to_string(),
            priority: Priority::Medium,
            state: state.to_string(),
            due_date: None,
            created_at: None,
            completed_at: None,
            trashed: false,
            shirt_size: ShirtSize::Missing,
            labels: Vec::new(),
            project: None,
            project_url: None,
            parent_id: None,
            children: Vec::new(),
        }
    }

    pub fn closed_row(id: &str, team: &str, assignee: &str, created: i64, done: i64) -> Row {
        let mut r = row(id, team, assignee, "Done");
        r.created_at = Some(days_ago(created));
        r.completed_at = Some(days_ago(done));
        r
    }

    pub fn child(id: &str, assignee: &str, state: &str) -> ChildRow {
        ChildRow {
            id: id.to_string(),
            title: format!("Sub-issue {id}"),
            team: "FCP".to_string(),
            assignee: assignee.to_string(),
            priority: Priority::Low,
            url: format!("https://linear.app/roxom/issue/{id}"),
            state: state.to_string(),
            project_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn population_excludes_eliminated_and_unassigned() {
        let config = AnalyticsConfig::default();
        let mut trashed = row("A-1", "FCP", "Marta", "Todo");
        trashed.trashed = true;
        let rows = vec![
            trashed,
            row("A-2", "FCP", "Unassigned", "Todo"),
            row("A-3", "FCP", "Marta", "Archived"),
            row("A-4", "FCP", "Marta", "Todo"),
            row("A-5", "FCP", "Marta", "Done"),
            row("A-6", "Ops", "Marta", "Canceled"),
            row("A-7", "LTO", "Unassigned", "Canceled"),
        ];
        let population = Population::new(&rows, Clock::fixed(now()), &config);
        let ids = |rows: &[&Row]| rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(&population.active), vec!["A-4", "A-5"]);
        assert_eq!(ids(&population.open), vec!["A-4"]);
        assert_eq!(ids(&population.closed), vec!["A-5"]);
        assert_eq!(ids(&population.canceled), vec!["A-7"]);
        assert_eq!(
            population.excluded_ids(),
            vec!["A-1", "A-2", "A-3", "A-6", "A-7"]
        );
    }

    #[test]
    fn overdue_and_due_soon_windows() {
        let config = AnalyticsConfig::default();
        let mut late = row("A-1", "FCP", "Marta", "Todo");
        late.due_date = Some(date_in(-1));
        let mut today = row("A-2", "FCP", "Marta", "Todo");
        today.due_date = Some(date_in(0));
        let mut week = row("A-3", "FCP", "Marta", "Todo");
        week.due_date = Some(date_in(7));
        let mut later = row("A-4", "FCP", "Marta", "Todo");
        later.due_date = Some(date_in(8));
        let rows = vec![late, today, week, later];
        let population = Population::new(&rows, Clock::fixed(now()), &config);

        assert_eq!(population.overdue.len(), 1);
        assert_eq!(population.due_soon.len(), 2);
    }

    #[test]
    fn status_counts_follow_canonical_order() {
        let rows = [
            row("A-1", "FCP", "Marta", "Todo"),
            row("A-2", "FCP", "Marta", "Waiting on vendor"),
            row("A-3", "FCP", "Marta", "Backlog"),
            row("A-4", "FCP", "Marta", "Todo"),
        ];
        let refs: Vec<&Row> = rows.iter().collect();
        let counts = status_counts(&refs);
        let order: Vec<(&str, usize)> = counts
            .iter()
            .map(|c| (c.status.as_str(), c.count))
            .collect();
        assert_eq!(
            order,
            vec![("Backlog", 1), ("Todo", 2), ("Waiting on vendor", 1)]
        );
    }

    #[test]
    fn ratios_guard_zero_denominators() {
        assert_eq!(percent(0, 0), None);
        assert_eq!(percent(2, 3), Some(67));
        assert_eq!(average_cycle_days(&[], 2), None);
        let outcome = sla_outcome(&[]);
        assert_eq!(outcome.compliance, None);
        assert_eq!(outcome.with_due_date, 0);
    }

    #[test]
    fn priority_counts_always_list_five() {
        let rows = [row("A-1", "FCP", "Marta", "Todo")];
        let refs: Vec<&Row> = rows.iter().collect();
        let counts = priority_counts(&refs);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[2].priority, Priority::Medium);
        assert_eq!(counts[2].count, 1);
        assert_eq!(counts[4].priority, Priority::NoPriority);
    }
}
