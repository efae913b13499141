//! DKR and OKR rollup.
//!
//! A DKR is a top-level issue titled `DKR <n>`; its progress is measured over
//! its sub-issues, or over itself when it has none. OKR cards group a team's
//! DKRs by the `OKR <n>` project they belong to.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{issue_ref, Population};
use crate::labels::{dkr_number, is_dkr_title, okr_number};
use crate::models::{is_main_team, Row, MAIN_TEAMS};
use crate::output::{BurndownPoint, DkrSummary, IssueRef, OkrCard, ProgressStatus};

const TARGET: u32 = 100;
const OKR_BUCKETS: [u8; 3] = [1, 2, 3];

pub(crate) struct OkrRollup {
    pub okrs_by_team: BTreeMap<String, Vec<OkrCard>>,
    pub dkr_summary_by_team: BTreeMap<String, Vec<DkrSummary>>,
    pub issues_by_okr: BTreeMap<String, Vec<IssueRef>>,
}

impl OkrRollup {
    pub fn dkr_count(&self) -> usize {
        self.dkr_summary_by_team.values().map(Vec::len).sum()
    }
}

struct DkrNode<'a> {
    row: &'a Row,
    team: String,
    total: usize,
    open: usize,
    closed: usize,
    completion: u32,
    okr_num: Option<u8>,
    project_name: Option<String>,
    members: Vec<IssueRef>,
}

impl DkrNode<'_> {
    fn summary(&self) -> DkrSummary {
        DkrSummary {
            identifier: self.row.id.clone(),
            name: self.row.title.clone(),
            team: self.team.clone(),
            total: self.total,
            open: self.open,
            closed: self.closed,
            completion: self.completion,
            target: TARGET,
            status: status_for_completion(self.completion),
            okr_num: self.okr_num,
        }
    }
}

/// `round(closed / total * 100)`, 0 for an empty set.
pub fn completion_percent(closed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((closed as f64 / total as f64) * 100.0).round() as u32
}

pub fn status_for_completion(completion: u32) -> ProgressStatus {
    match completion {
        c if c >= 100 => ProgressStatus::Done,
        c if c >= 50 => ProgressStatus::OnTrack,
        c if c >= 25 => ProgressStatus::AtRisk,
        _ => ProgressStatus::Blocked,
    }
}

/// OKR card status. An On Hold DKR blocks the card outright; a card past
/// its latest DKR due date and not finished is at risk; otherwise the
/// completion ladder applies.
pub fn okr_status(completion: u32, has_on_hold: bool, past_due: bool) -> ProgressStatus {
    if has_on_hold {
        ProgressStatus::Blocked
    } else if completion < TARGET && past_due {
        ProgressStatus::AtRisk
    } else {
        status_for_completion(completion)
    }
}

pub(crate) fn build_okr_rollup(pop: &Population) -> OkrRollup {
    let mut dkr_summary_by_team = BTreeMap::new();
    let mut okrs_by_team = BTreeMap::new();
    let mut issues_by_okr = BTreeMap::new();

    for team in MAIN_TEAMS {
        let nodes = team_dkrs(pop, team);
        for node in &nodes {
            issues_by_okr.insert(node.row.id.clone(), node.members.clone());
        }
        let cards = OKR_BUCKETS
            .iter()
            .map(|okr| okr_card(pop, team, *okr, &nodes, &mut issues_by_okr))
            .collect();
        dkr_summary_by_team.insert(
            team.to_string(),
            nodes.iter().map(DkrNode::summary).collect(),
        );
        okrs_by_team.insert(team.to_string(), cards);
    }

    OkrRollup {
        okrs_by_team,
        dkr_summary_by_team,
        issues_by_okr,
    }
}

/// A team's DKR nodes ordered by DKR number, then title; unnumbered last.
fn team_dkrs<'a>(pop: &Population<'a>, team: &str) -> Vec<DkrNode<'a>> {
    let mut rows: Vec<(&Row, String)> = pop
        .active
        .iter()
        .copied()
        .filter(|r| r.parent_id.is_none() && is_dkr_title(&r.title))
        .map(|r| (r, pop.classifier.dkr_team(r)))
        .filter(|(_, dkr_team)| is_main_team(dkr_team) && dkr_team == team)
        .collect();
    rows.sort_by(|(a, _), (b, _)| {
        let key = |r: &Row| {
            let number = dkr_number(&r.title);
            (number.is_none(), number)
        };
        key(a).cmp(&key(b)).then_with(|| a.title.cmp(&b.title))
    });
    rows.into_iter()
        .map(|(row, team)| dkr_node(pop, row, team))
        .collect()
}

fn dkr_node<'a>(pop: &Population<'a>, row: &'a Row, team: String) -> DkrNode<'a> {
    let classifier = &pop.classifier;
    let (total, open, closed, members) = if row.children.is_empty() {
        let open = classifier.is_open_default(&row.state);
        let closed = classifier.is_closed_default(&row.state) || row.completed_at.is_some();
        let mut member = issue_ref(row, false);
        member.team = team.clone();
        (1, usize::from(open), usize::from(closed), vec![member])
    } else {
        let open = row
            .children
            .iter()
            .filter(|c| classifier.is_open_default(&c.state))
            .count();
        let closed = row
            .children
            .iter()
            .filter(|c| classifier.is_closed_default(&c.state))
            .count();
        let members = row
            .children
            .iter()
            .map(|c| IssueRef {
                id: c.id.clone(),
                title: c.title.clone(),
                team: team.clone(),
                assignee: c.assignee.clone(),
                priority: c.priority,
                url: c.url.clone(),
                state: None,
            })
            .collect();
        (row.children.len(), open, closed, members)
    };

    let project_name = row
        .project
        .clone()
        .or_else(|| row.children.first().and_then(|c| c.project_name.clone()));
    DkrNode {
        row,
        team,
        total,
        open,
        closed,
        completion: completion_percent(closed, total),
        okr_num: project_name.as_deref().and_then(okr_number),
        project_name,
        members,
    }
}

/// One OKR card. Counts are of DKRs, judged by each DKR's own state.
fn okr_card(
    pop: &Population,
    team: &str,
    okr: u8,
    nodes: &[DkrNode],
    issues_by_okr: &mut BTreeMap<String, Vec<IssueRef>>,
) -> OkrCard {
    let classifier = &pop.classifier;
    let dkrs: Vec<&DkrNode> = nodes.iter().filter(|n| n.okr_num == Some(okr)).collect();
    let total = dkrs.len();
    let open = dkrs
        .iter()
        .filter(|n| classifier.is_open_default(&n.row.state))
        .count();
    let closed = dkrs
        .iter()
        .filter(|n| classifier.is_closed_default(&n.row.state))
        .count();
    let name = dkrs
        .first()
        .and_then(|n| n.project_name.clone())
        .unwrap_or_else(|| format!("OKR{okr}"));
    let url = dkrs.first().and_then(|n| n.row.project_url.clone());

    if !dkrs.is_empty() {
        let listed = dkrs
            .iter()
            .map(|n| {
                let mut entry = issue_ref(n.row, true);
                entry.team = team.to_string();
                entry
            })
            .collect();
        issues_by_okr.insert(format!("{team}:{name}"), listed);
    }

    let completion = completion_percent(closed, total);
    let has_on_hold = dkrs
        .iter()
        .any(|n| n.row.state.trim().eq_ignore_ascii_case("On Hold"));
    let latest_due: Option<NaiveDate> = dkrs.iter().filter_map(|n| n.row.due_date).max();
    let past_due = latest_due.is_some_and(|due| pop.today() > due);

    OkrCard {
        name,
        team: team.to_string(),
        total,
        open,
        closed,
        completion,
        target: TARGET,
        status: okr_status(completion, has_on_hold, past_due),
        url,
        burndown: burndown(pop, total, open, closed),
    }
}

/// Three-point burndown: start, midpoint estimate, and today.
fn burndown(pop: &Population, total: usize, open: usize, closed: usize) -> Vec<BurndownPoint> {
    vec![
        BurndownPoint {
            day: "start".to_string(),
            remaining: total,
            ideal: total,
        },
        BurndownPoint {
            day: "midpoint".to_string(),
            remaining: open + (closed as f64 * 0.3).round() as usize,
            ideal: (total as f64 * 0.5).round() as usize,
        },
        BurndownPoint {
            day: pop.today().format("%Y-%m-%d").to_string(),
            remaining: open,
            ideal: 0,
        },
    ]
}
