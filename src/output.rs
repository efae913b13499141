//! Output model handed to the rendering collaborator.
//!
//! The renderer locates sub-blocks by name and position, so field names here
//! are part of the contract. Maps are `BTreeMap` so that two runs over the
//! same input serialize identically.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::labels::WorkType;
use crate::models::{Priority, ShirtSize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsModel {
    pub summary_stats: SummaryStats,
    pub team_detailed_data: BTreeMap<String, TeamDetail>,
    pub assignee_detailed_data: BTreeMap<String, AssigneeDetail>,
    pub performance_data: Vec<PerformanceEntry>,
    pub quality_data: Vec<QualityEntry>,
    pub data_quality_issues: BTreeMap<String, QualityIssues>,
    pub weekly_data: Vec<WeeklyEntry>,
    pub cycle_time_data: Vec<CycleTimeBucket>,
    pub deleted_issue_ids: Vec<String>,
    pub issues_by_status: BTreeMap<String, Vec<IssueRef>>,
    pub issues_by_priority: BTreeMap<Priority, Vec<IssueRef>>,
    pub issues_by_shirt_size: BTreeMap<ShirtSize, Vec<IssueRef>>,
    pub okrs_data_by_team: BTreeMap<String, Vec<OkrCard>>,
    pub dkr_summary_by_team: BTreeMap<String, Vec<DkrSummary>>,
    #[serde(rename = "issuesByOKR")]
    pub issues_by_okr: BTreeMap<String, Vec<IssueRef>>,
    pub canceled_issues: Vec<IssueRef>,
    pub duplicated_issues: Vec<IssueRef>,
}

/// Drill-down entry shared by most issue lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRef {
    pub id: String,
    pub title: String,
    pub team: String,
    pub assignee: String,
    pub priority: Priority,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: usize,
    pub total_open: usize,
    pub total_closed: usize,
    pub overdue: usize,
    pub due_soon: usize,
    pub no_due_date: usize,
    pub unassigned: usize,
    pub avg_cycle_time: f64,
    pub avg_cycle_time_prev: f64,
    pub velocity: f64,
    pub velocity_prev: f64,
    pub sla_compliance: Option<u32>,
    pub sla_compliance_prev: Option<u32>,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub by_shirt_size: Vec<ShirtSizeCount>,
    pub by_work_type: Vec<WorkTypeCount>,
    pub by_team: Vec<TeamStats>,
    pub by_assignee: Vec<AssigneeStats>,
    pub overdue_issues: Vec<OverdueIssue>,
    pub due_soon_issues: Vec<DueSoonIssue>,
    pub closed_issues: Vec<ClosedIssue>,
    pub canceled_count: usize,
    pub duplicated_count: usize,
    pub canceled_by_team: BTreeMap<String, Vec<IssueRef>>,
    pub duplicated_by_team: BTreeMap<String, Vec<IssueRef>>,
    pub canceled_by_assignee: BTreeMap<String, Vec<IssueRef>>,
    pub duplicated_by_assignee: BTreeMap<String, Vec<IssueRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShirtSizeCount {
    pub size: ShirtSize,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkTypeCount {
    #[serde(rename = "type")]
    pub work_type: WorkType,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team: String,
    pub open: usize,
    pub closed: usize,
    pub overdue: usize,
    pub velocity: f64,
    pub closed_with_due_date: usize,
    pub closed_on_time: usize,
    pub sla: Option<u32>,
    pub avg_cycle_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssigneeStats {
    pub assignee: String,
    pub open: usize,
    pub weighted: u32,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueIssue {
    pub id: String,
    pub title: String,
    pub team: String,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub assignee: String,
    pub priority: Priority,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueSoonIssue {
    pub id: String,
    pub title: String,
    pub team: String,
    pub due_date: NaiveDate,
    pub assignee: String,
    pub priority: Priority,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedIssue {
    pub id: String,
    pub title: String,
    pub team: String,
    pub assignee: String,
    pub priority: Priority,
    pub url: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub overdue: usize,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub by_shirt_size: Vec<ShirtSizeCount>,
    pub overdue_issues: Vec<OverdueIssue>,
    pub issues_by_shirt_size: BTreeMap<ShirtSize, Vec<IssueRef>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeDetail {
    pub open: usize,
    pub closed: usize,
    pub overdue: usize,
    pub weighted: u32,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub by_shirt_size: Vec<ShirtSizeCount>,
    pub overdue_issues: Vec<OverdueIssue>,
    pub issues_by_shirt_size: BTreeMap<ShirtSize, Vec<IssueRef>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceEntry {
    pub assignee: String,
    pub closed_count: usize,
    pub avg_lead_time: Option<f64>,
    pub total_points: u32,
    pub by_shirt_size: Vec<ShirtSizePoints>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShirtSizePoints {
    pub size: ShirtSize,
    pub count: usize,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityEntry {
    pub team: String,
    pub open: usize,
    pub missing_shirt: usize,
    pub missing_company: usize,
    pub missing_group: usize,
    pub missing_work_type: usize,
    pub completeness: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssues {
    pub missing_shirt: Vec<QualityIssue>,
    pub missing_company: Vec<QualityIssue>,
    pub missing_group: Vec<QualityIssue>,
    pub missing_work_type: Vec<QualityIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityIssue {
    pub id: String,
    pub title: String,
    pub assignee: String,
    pub status: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyEntry {
    pub week: String,
    pub week_start: NaiveDate,
    pub created: usize,
    pub closed: usize,
    pub open_end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleTimeBucket {
    pub range: &'static str,
    pub count: usize,
    pub pct: u32,
}

/// Completion state shared by DKR rows and OKR cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Done,
    OnTrack,
    AtRisk,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DkrSummary {
    pub identifier: String,
    pub name: String,
    pub team: String,
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub completion: u32,
    pub target: u32,
    pub status: ProgressStatus,
    pub okr_num: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OkrCard {
    pub name: String,
    pub team: String,
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub completion: u32,
    pub target: u32,
    pub status: ProgressStatus,
    pub url: Option<String>,
    pub burndown: Vec<BurndownPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurndownPoint {
    pub day: String,
    pub remaining: usize,
    pub ideal: usize,
}
