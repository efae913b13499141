use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{
    assignees_in_order, average_cycle_days, completed_since, for_assignee, in_team, issue_ref,
    overdue_issues, priority_counts, round_to, sla_outcome, status_counts,
    weighted_load, Population,
};
use crate::labels::{work_types, WorkType};
use crate::models::{Priority, Row, ShirtSize, ALL_TEAMS, MAIN_TEAMS, PGA};
use crate::output::{
    AssigneeStats, ClosedIssue, DueSoonIssue, IssueRef, ShirtSizeCount, SummaryStats, TeamStats,
    WorkTypeCount,
};

const VELOCITY_WEEKS: i64 = 10;
const PREVIOUS_WINDOW_START_WEEKS: i64 = 8;
const PREVIOUS_WINDOW_END_WEEKS: i64 = 4;

pub(crate) fn build_summary(pop: &Population) -> SummaryStats {
    let today = pop.today();
    let open = pop.reported_open();
    let by_status = status_counts(&open);
    let total_open: usize = by_status.iter().map(|s| s.count).sum();

    let closed_main = pop.main_closed();
    let dated_main: Vec<&Row> = closed_main
        .iter()
        .copied()
        .filter(|r| r.created_at.is_some() && r.completed_at.is_some())
        .collect();
    let previous = in_previous_window(
        &dated_main,
        pop.clock.weeks_ago(PREVIOUS_WINDOW_START_WEEKS),
        pop.clock.weeks_ago(PREVIOUS_WINDOW_END_WEEKS),
    );
    let velocity_prev = if previous.is_empty() {
        0.0
    } else {
        round_to(previous.len() as f64 / PREVIOUS_WINDOW_END_WEEKS as f64, 1)
    };

    let overdue = super::only_reported(&pop.overdue);
    let due_soon = super::only_reported(&pop.due_soon);
    let mut closed_issues: Vec<ClosedIssue> = super::only_reported(&pop.closed)
        .iter()
        .map(|r| closed_issue(r))
        .collect();
    closed_issues.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    SummaryStats {
        total: super::only_reported(&pop.active).len(),
        total_open,
        total_closed: closed_issues.len(),
        overdue: overdue.len(),
        due_soon: due_soon.len(),
        no_due_date: open.iter().filter(|r| r.due_date.is_none()).count(),
        unassigned: open.iter().filter(|r| r.is_unassigned()).count(),
        avg_cycle_time: average_cycle_days(&dated_main, 2).unwrap_or(0.0),
        avg_cycle_time_prev: average_cycle_days(&previous, 2).unwrap_or(0.0),
        velocity: velocity(&closed_main, pop),
        velocity_prev,
        sla_compliance: sla_outcome(&closed_main).compliance,
        sla_compliance_prev: sla_outcome(&previous).compliance,
        by_status,
        by_priority: priority_counts(&open),
        by_shirt_size: shirt_size_distribution(&open, total_open),
        by_work_type: work_type_distribution(&open),
        by_team: team_breakdown(pop),
        by_assignee: assignee_breakdown(pop),
        overdue_issues: overdue_issues(&overdue, today),
        due_soon_issues: due_soon.iter().filter_map(|r| due_soon_issue(r)).collect(),
        closed_issues,
        canceled_count: pop.canceled.len(),
        duplicated_count: pop.duplicated.len(),
        canceled_by_team: by_team_lists(&pop.canceled),
        duplicated_by_team: by_team_lists(&pop.duplicated),
        canceled_by_assignee: by_assignee_lists(&pop.canceled, &pop.duplicated, &pop.canceled),
        duplicated_by_assignee: by_assignee_lists(
            &pop.canceled,
            &pop.duplicated,
            &pop.duplicated,
        ),
    }
}

/// Closures per week over the trailing velocity window, one decimal.
fn velocity(closed: &[&Row], pop: &Population) -> f64 {
    let recent = completed_since(closed, pop.clock.weeks_ago(VELOCITY_WEEKS));
    round_to(recent as f64 / VELOCITY_WEEKS as f64, 1)
}

fn in_previous_window<'a>(
    rows: &[&'a Row],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&'a Row> {
    rows.iter()
        .copied()
        .filter(|r| r.completed_at.is_some_and(|done| done >= start && done < end))
        .collect()
}

/// Open, closed, overdue, velocity, SLA and cycle time for one team, using
/// that team's own taxonomy.
pub(crate) fn team_stats(pop: &Population, team: &str) -> TeamStats {
    let today = pop.today();
    let taxonomy = pop.classifier.taxonomy(team);
    let team_rows = in_team(&pop.active, team);
    let open: Vec<&Row> = team_rows
        .iter()
        .copied()
        .filter(|r| taxonomy.is_open(&r.state))
        .collect();
    let closed: Vec<&Row> = team_rows
        .iter()
        .copied()
        .filter(|r| taxonomy.is_closed(&r.state))
        .collect();
    let sla = sla_outcome(&closed);

    TeamStats {
        team: team.to_string(),
        open: open.len(),
        closed: closed.len(),
        overdue: open
            .iter()
            .filter(|r| r.due_date.is_some_and(|due| due < today))
            .count(),
        velocity: velocity(&closed, pop),
        closed_with_due_date: sla.with_due_date,
        closed_on_time: sla.on_time,
        sla: sla.compliance,
        avg_cycle_time: average_cycle_days(&closed, 2),
    }
}

/// The four main teams always; PGA only when it has active issues.
fn team_breakdown(pop: &Population) -> Vec<TeamStats> {
    let mut teams: Vec<TeamStats> = MAIN_TEAMS.iter().map(|t| team_stats(pop, t)).collect();
    if pop.has_pga() {
        teams.push(team_stats(pop, PGA));
    }
    teams
}

fn assignee_breakdown(pop: &Population) -> Vec<AssigneeStats> {
    let open = pop.main_open();
    let overdue = super::only_main(&pop.overdue);
    assignees_in_order(open.iter().copied())
        .into_iter()
        .map(|assignee| {
            let person_open = for_assignee(&open, &assignee);
            AssigneeStats {
                open: person_open.len(),
                weighted: weighted_load(&person_open),
                overdue: for_assignee(&overdue, &assignee).len(),
                assignee,
            }
        })
        .collect()
}

/// Non-empty sizes with their weights. An all-empty distribution still
/// lists every size so the chart keeps its labels.
fn shirt_size_distribution(open: &[&Row], total_open: usize) -> Vec<ShirtSizeCount> {
    let counts: Vec<ShirtSizeCount> = ShirtSize::ALL
        .iter()
        .map(|size| ShirtSizeCount {
            size: *size,
            count: open.iter().filter(|r| r.shirt_size == *size).count(),
            weight: Some(size.weight()),
        })
        .filter(|c| c.count > 0)
        .collect();
    if !counts.is_empty() {
        return counts;
    }
    ShirtSize::ALL
        .iter()
        .map(|size| ShirtSizeCount {
            size: *size,
            count: if *size == ShirtSize::Missing {
                total_open
            } else {
                0
            },
            weight: Some(size.weight()),
        })
        .collect()
}

fn work_type_distribution(open: &[&Row]) -> Vec<WorkTypeCount> {
    let tagged: Vec<Vec<WorkType>> = open.iter().map(|r| work_types(&r.labels)).collect();
    WorkType::ORDER
        .iter()
        .map(|work_type| WorkTypeCount {
            work_type: *work_type,
            count: tagged.iter().filter(|types| types.contains(work_type)).count(),
        })
        .collect()
}

fn by_team_lists(rows: &[&Row]) -> BTreeMap<String, Vec<IssueRef>> {
    ALL_TEAMS
        .iter()
        .map(|team| {
            let issues = in_team(rows, team)
                .into_iter()
                .map(|r| issue_ref(r, false))
                .collect();
            (team.to_string(), issues)
        })
        .collect()
}

/// Keyed by everyone with a canceled or duplicate issue, so both maps share
/// the same keys.
fn by_assignee_lists(
    canceled: &[&Row],
    duplicated: &[&Row],
    rows: &[&Row],
) -> BTreeMap<String, Vec<IssueRef>> {
    let mut people: Vec<&str> = canceled
        .iter()
        .chain(duplicated.iter())
        .map(|r| r.assignee.as_str())
        .collect();
    people.sort_unstable();
    people.dedup();
    people
        .into_iter()
        .map(|person| {
            let issues = for_assignee(rows, person)
                .into_iter()
                .map(|r| issue_ref(r, false))
                .collect();
            (person.to_string(), issues)
        })
        .collect()
}

fn closed_issue(row: &Row) -> ClosedIssue {
    ClosedIssue {
        id: row.id.clone(),
        title: row.title.clone(),
        team: row.dashboard_team.clone(),
        assignee: row.assignee.clone(),
        priority: row.priority,
        url: row.url.clone(),
        completed_at: row.completed_at,
        created_at: row.created_at,
    }
}

fn due_soon_issue(row: &Row) -> Option<DueSoonIssue> {
    Some(DueSoonIssue {
        id: row.id.clone(),
        title: row.title.clone(),
        team: row.dashboard_team.clone(),
        due_date: row.due_date?,
        assignee: row.assignee.clone(),
        priority: row.priority,
        url: row.url.clone(),
    })
}

/// Drill-down behind the status chart.
pub(crate) fn issues_by_status(pop: &Population) -> BTreeMap<String, Vec<IssueRef>> {
    let mut grouped: BTreeMap<String, Vec<IssueRef>> = BTreeMap::new();
    for row in pop.reported_open() {
        grouped
            .entry(row.state.clone())
            .or_default()
            .push(issue_ref(row, true));
    }
    grouped
}

pub(crate) fn issues_by_priority(pop: &Population) -> BTreeMap<Priority, Vec<IssueRef>> {
    let mut grouped: BTreeMap<Priority, Vec<IssueRef>> = BTreeMap::new();
    for row in pop.reported_open() {
        grouped
            .entry(row.priority)
            .or_default()
            .push(issue_ref(row, true));
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::clock::Clock;
    use crate::config::AnalyticsConfig;

    fn summary(rows: &[Row]) -> SummaryStats {
        let config = AnalyticsConfig::default();
        let population = Population::new(rows, Clock::fixed(now()), &config);
        build_summary(&population)
    }

    #[test]
    fn fcp_example_breakdown() {
        let mut rows = Vec::new();
        for i in 0..2 {
            rows.push(row(&format!("FCP-{i}"), "FCP", "Marta", "Backlog"));
        }
        for i in 2..6 {
            rows.push(row(&format!("FCP-{i}"), "FCP", "Marta", "Todo"));
        }
        for i in 6..10 {
            let mut done = closed_row(&format!("FCP-{i}"), "FCP", "Marta", 20, 15);
            done.due_date = Some(date_in(-10));
            rows.push(done);
        }

        let stats = summary(&rows);
        let fcp = stats.by_team.iter().find(|t| t.team == "FCP").unwrap();
        assert_eq!(fcp.open, 6);
        assert_eq!(fcp.closed, 4);
        assert_eq!(fcp.sla, Some(100));
        assert_eq!(fcp.avg_cycle_time, Some(5.0));
        assert_eq!(fcp.velocity, 0.4);
        assert_eq!(stats.total_open, 6);
        assert_eq!(stats.total_closed, 4);
        assert_eq!(stats.total, 10);
    }

    #[test]
    fn total_open_is_sum_of_status_counts() {
        let rows = vec![
            row("A-1", "FCP", "Marta", "Todo"),
            row("A-2", "LTO", "Juan", "In Review"),
            row("A-3", "PGA", "Ana", "Backlog"),
            row("A-4", "Ops", "Ana", "Backlog"),
            row("A-5", "RPA", "Ana", "Pending Signature"),
        ];
        let stats = summary(&rows);
        let sum: usize = stats.by_status.iter().map(|s| s.count).sum();
        assert_eq!(stats.total_open, sum);
        assert_eq!(stats.total_open, 3);
    }

    #[test]
    fn velocity_windows() {
        let rows = vec![
            closed_row("A-1", "FCP", "Marta", 30, 3),
            closed_row("A-2", "FCP", "Marta", 50, 40),
            closed_row("A-3", "LTO", "Marta", 70, 45),
            closed_row("A-4", "LTO", "Marta", 120, 80),
        ];
        let stats = summary(&rows);
        assert_eq!(stats.velocity, 0.3);
        // 40 and 45 days ago fall in [8w, 4w)
        assert_eq!(stats.velocity_prev, 0.5);
        assert_eq!(stats.avg_cycle_time_prev, 17.5);
    }

    #[test]
    fn sla_only_counts_closed_with_due_date() {
        let mut late = closed_row("A-1", "FCP", "Marta", 10, 2);
        late.due_date = Some(date_in(-5));
        let mut on_time = closed_row("A-2", "FCP", "Marta", 10, 2);
        on_time.due_date = Some(date_in(-2));
        let no_due = closed_row("A-3", "FCP", "Marta", 10, 2);
        let stats = summary(&[late, on_time, no_due]);
        assert_eq!(stats.sla_compliance, Some(50));

        let empty = summary(&[closed_row("A-4", "FCP", "Marta", 10, 2)]);
        assert_eq!(empty.sla_compliance, None);
    }

    #[test]
    fn pga_team_uses_own_taxonomy() {
        let rows = vec![
            row("P-1", "PGA", "Ana", "Pending Signature"),
            row("P-2", "PGA", "Ana", "Ongoing"),
            row("P-3", "PGA", "Ana", "Todo"),
        ];
        let stats = summary(&rows);
        let pga = stats.by_team.last().unwrap();
        assert_eq!(pga.team, "PGA");
        assert_eq!(pga.open, 2);
        assert_eq!(pga.closed, 1);
        // Totals use the default taxonomy.
        assert_eq!(stats.total_open, 1);
        assert_eq!(stats.by_team.len(), 5);

        let without_pga = summary(&[row("A-1", "FCP", "Marta", "Todo")]);
        assert_eq!(without_pga.by_team.len(), 4);
    }

    #[test]
    fn assignee_weighted_load_uses_shirt_weights() {
        let mut a = row("A-1", "FCP", "Marta", "Todo");
        a.shirt_size = ShirtSize::L;
        let mut b = row("A-2", "LTO", "Marta", "Backlog");
        b.shirt_size = ShirtSize::XL;
        b.due_date = Some(date_in(-3));
        let c = row("A-3", "PGA", "Marta", "Todo");
        let stats = summary(&[a, b, c]);
        assert_eq!(
            stats.by_assignee,
            vec![AssigneeStats {
                assignee: "Marta".to_string(),
                open: 2,
                weighted: 13,
                overdue: 1,
            }]
        );
    }

    #[test]
    fn work_types_overlap() {
        let mut both = row("A-1", "FCP", "Marta", "Todo");
        both.labels = vec!["OKR".to_string(), "BAU".to_string()];
        let plain = row("A-2", "FCP", "Marta", "Todo");
        let stats = summary(&[both, plain]);
        let counts: Vec<usize> = stats.by_work_type.iter().map(|w| w.count).collect();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn empty_shirt_distribution_lists_every_size() {
        let stats = summary(&[]);
        assert_eq!(stats.by_shirt_size.len(), 6);
        assert!(stats.by_shirt_size.iter().all(|s| s.count == 0));
        assert_eq!(stats.avg_cycle_time, 0.0);
        assert_eq!(stats.velocity, 0.0);
    }

    #[test]
    fn canceled_and_duplicates_skip_trashed_rows() {
        let mut trashed = row("A-1", "FCP", "Marta", "Canceled");
        trashed.trashed = true;
        let rows = vec![
            trashed,
            row("A-2", "FCP", "Marta", "Canceled"),
            row("A-3", "LTO", "Juan", "Duplicate"),
        ];
        let stats = summary(&rows);
        assert_eq!(stats.canceled_count, 1);
        assert_eq!(stats.duplicated_count, 1);
        assert_eq!(stats.canceled_by_team["FCP"].len(), 1);
        assert_eq!(stats.canceled_by_assignee["Juan"].len(), 0);
        assert_eq!(stats.duplicated_by_assignee["Juan"].len(), 1);
        assert_eq!(stats.total_open, 0);
        assert_eq!(stats.total_closed, 0);
    }

    #[test]
    fn overdue_issues_sorted_most_late_first() {
        let mut a = row("A-1", "FCP", "Marta", "Todo");
        a.due_date = Some(date_in(-2));
        let mut b = row("A-2", "FCP", "Marta", "Todo");
        b.due_date = Some(date_in(-9));
        let stats = summary(&[a, b]);
        let ids: Vec<&str> = stats.overdue_issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A-2", "A-1"]);
        assert_eq!(stats.overdue_issues[0].days_overdue, 9);
    }
}
