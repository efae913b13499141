use std::collections::BTreeMap;

use super::{in_team, Population};
use crate::labels::{has_company_label, has_work_type};
use crate::models::{Row, ShirtSize, MAIN_TEAMS};
use crate::output::{QualityEntry, QualityIssue, QualityIssues};

const CHECKS: usize = 4;

fn quality_issue(row: &Row) -> QualityIssue {
    QualityIssue {
        id: row.id.clone(),
        title: row.title.clone(),
        assignee: row.assignee.clone(),
        status: row.state.clone(),
        url: row.url.clone(),
    }
}

fn missing(rows: &[&Row], has_field: impl Fn(&Row) -> bool) -> Vec<QualityIssue> {
    rows.iter()
        .copied()
        .filter(|r| !has_field(*r))
        .map(quality_issue)
        .collect()
}

/// `round((4N - missing) / 4N * 100)`; a team with no open rows is complete.
pub fn completeness(open: usize, missing: usize) -> u32 {
    if open == 0 {
        return 100;
    }
    let checks = (CHECKS * open) as f64;
    (((checks - missing as f64) / checks) * 100.0).round() as u32
}

/// Required-field checks over each main team's open rows. Counts are the
/// lengths of the drill-down lists returned alongside them.
pub(crate) fn build_quality(
    pop: &Population,
) -> (Vec<QualityEntry>, BTreeMap<String, QualityIssues>) {
    let companies = &pop.config.quality.company_labels;
    let mut entries = Vec::new();
    let mut issues = BTreeMap::new();

    for team in MAIN_TEAMS {
        let open = in_team(&pop.open, team);
        let lists = QualityIssues {
            missing_shirt: missing(&open, |r| r.shirt_size != ShirtSize::Missing),
            missing_company: missing(&open, |r| has_company_label(&r.labels, companies)),
            missing_group: missing(&open, |r| r.group.is_some()),
            missing_work_type: missing(&open, |r| has_work_type(&r.labels)),
        };
        let missing_total = lists.missing_shirt.len()
            + lists.missing_company.len()
            + lists.missing_group.len()
            + lists.missing_work_type.len();
        entries.push(QualityEntry {
            team: team.to_string(),
            open: open.len(),
            missing_shirt: lists.missing_shirt.len(),
            missing_company: lists.missing_company.len(),
            missing_group: lists.missing_group.len(),
            missing_work_type: lists.missing_work_type.len(),
            completeness: completeness(open.len(), missing_total),
        });
        issues.insert(team.to_string(), lists);
    }

    (entries, issues)
}
