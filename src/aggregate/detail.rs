use std::collections::BTreeMap;

use super::{
    assignees_in_order, average_cycle_days, for_assignee, in_team, issues_by_shirt_size,
    only_main, overdue_issues, priority_counts, shirt_counts_from, status_counts, weighted_load,
    Population,
};
use crate::models::{Row, ShirtSize, MAIN_TEAMS};
use crate::output::{AssigneeDetail, PerformanceEntry, ShirtSizePoints, TeamDetail};

/// Per main team drill-down. Shirt-size counts are read off the same lists
/// the view exposes.
pub(crate) fn team_detailed_data(pop: &Population) -> BTreeMap<String, TeamDetail> {
    let today = pop.today();
    MAIN_TEAMS
        .iter()
        .map(|team| {
            let open = in_team(&pop.open, team);
            let closed = in_team(&pop.closed, team).len();
            let overdue = in_team(&pop.overdue, team);
            let issues_by_shirt_size = issues_by_shirt_size(&open);
            let detail = TeamDetail {
                total: open.len() + closed,
                open: open.len(),
                closed,
                overdue: overdue.len(),
                by_status: status_counts(&open),
                by_priority: priority_counts(&open),
                by_shirt_size: shirt_counts_from(&issues_by_shirt_size),
                overdue_issues: overdue_issues(&overdue, today),
                issues_by_shirt_size,
            };
            (team.to_string(), detail)
        })
        .collect()
}

/// Per assignee drill-down over main-team open issues.
pub(crate) fn assignee_detailed_data(pop: &Population) -> BTreeMap<String, AssigneeDetail> {
    let today = pop.today();
    let open = pop.main_open();
    let closed = pop.main_closed();
    let overdue = only_main(&pop.overdue);

    assignees_in_order(open.iter().copied())
        .into_iter()
        .map(|assignee| {
            let person_open = for_assignee(&open, &assignee);
            let person_overdue = for_assignee(&overdue, &assignee);
            let issues_by_shirt_size = issues_by_shirt_size(&person_open);
            let detail = AssigneeDetail {
                open: person_open.len(),
                closed: for_assignee(&closed, &assignee).len(),
                overdue: person_overdue.len(),
                weighted: weighted_load(&person_open),
                by_status: status_counts(&person_open),
                by_priority: priority_counts(&person_open),
                by_shirt_size: shirt_counts_from(&issues_by_shirt_size),
                overdue_issues: overdue_issues(&person_overdue, today),
                issues_by_shirt_size,
            };
            (assignee, detail)
        })
        .collect()
}

/// Throughput per person: everyone with open or closed main-team work.
pub(crate) fn performance_data(pop: &Population) -> Vec<PerformanceEntry> {
    let open = pop.main_open();
    let closed = pop.main_closed();
    assignees_in_order(open.iter().chain(closed.iter()).copied())
        .into_iter()
        .map(|assignee| {
            let person_closed = for_assignee(&closed, &assignee);
            let by_shirt_size = points_by_size(&person_closed);
            PerformanceEntry {
                closed_count: person_closed.len(),
                avg_lead_time: average_cycle_days(&person_closed, 1),
                total_points: by_shirt_size.iter().map(|s| s.points).sum(),
                by_shirt_size,
                assignee,
            }
        })
        .collect()
}

fn points_by_size(closed: &[&Row]) -> Vec<ShirtSizePoints> {
    ShirtSize::ALL
        .iter()
        .filter_map(|size| {
            let count = closed.iter().filter(|r| r.shirt_size == *size).count();
            (count > 0).then(|| ShirtSizePoints {
                size: *size,
                count,
                points: size.weight() * count as u32,
            })
        })
        .collect()
}
