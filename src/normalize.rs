use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use crate::classify::Classifier;
use crate::config::{AnalyticsConfig, TeamDirectory};
use crate::labels;
use crate::models::{
    ChildRow, Priority, RawChild, RawIssue, Row, ShirtSize, ALL_TEAMS, UNASSIGNED, UNKNOWN_STATE,
};

/// Builds the canonical [`Row`] for one raw issue. Never fails: missing or
/// unparseable optional fields fall back to their documented defaults.
pub fn normalize(raw: &RawIssue, config: &AnalyticsConfig) -> Row {
    let classifier = Classifier::new(config);
    let team = normalize_team(
        raw.team_name.as_deref(),
        raw.team_key.as_deref(),
        &config.teams,
    );
    let assignee = assignee_display_name(raw.assignee.as_deref(), &config.teams);
    let dashboard_team = classifier.dashboard_team(&team, &assignee);
    let project_url = raw
        .project
        .as_ref()
        .and_then(|p| p.slug.as_deref())
        .filter(|slug| !slug.is_empty())
        .map(|slug| config.links.project_url(slug));

    let children = raw
        .children
        .iter()
        .map(|child| normalize_child(child, &team, config))
        .collect();

    Row {
        id: raw.id.clone(),
        title: raw.title.clone(),
        url: issue_url(raw.url.as_deref(), &raw.id, config),
        group: labels::classify_group(&raw.labels),
        priority: Priority::from_level(raw.priority),
        state: state_name(raw.state.as_deref()),
        due_date: raw
            .due_date
            .as_deref()
            .and_then(|value| parse_date(&raw.id, "dueDate", value)),
        created_at: raw
            .created_at
            .as_deref()
            .and_then(|value| parse_timestamp(&raw.id, "createdAt", value)),
        completed_at: raw
            .completed_at
            .as_deref()
            .and_then(|value| parse_timestamp(&raw.id, "completedAt", value)),
        trashed: raw.trashed,
        shirt_size: resolve_shirt_size(&raw.labels, raw.estimate),
        labels: raw.labels.clone(),
        project: raw.project.as_ref().and_then(|p| p.name.clone()),
        project_url,
        parent_id: raw.parent_id.clone(),
        children,
        team,
        dashboard_team,
        assignee,
    }
}

fn normalize_child(child: &RawChild, team: &str, config: &AnalyticsConfig) -> ChildRow {
    ChildRow {
        id: child.id.clone(),
        title: child.title.clone(),
        team: team.to_string(),
        assignee: assignee_display_name(child.assignee.as_deref(), &config.teams),
        priority: Priority::from_level(child.priority),
        url: issue_url(child.url.as_deref(), &child.id, config),
        state: state_name(child.state.as_deref()),
        project_name: child.project_name.clone(),
    }
}

/// Team code: the name table first, then a known key, else the raw name.
pub fn normalize_team(name: Option<&str>, key: Option<&str>, teams: &TeamDirectory) -> String {
    let name = name.unwrap_or_default();
    if let Some(code) = teams.code_for_name(name) {
        return code.to_string();
    }
    if let Some(key) = key.filter(|k| ALL_TEAMS.contains(k)) {
        return key.to_string();
    }
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

pub fn assignee_display_name(name: Option<&str>, teams: &TeamDirectory) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => teams.display_name(name),
        None => UNASSIGNED.to_string(),
    }
}

/// Labels first, then the numeric estimate, else `Missing`.
pub fn resolve_shirt_size(labels: &[String], estimate: Option<f64>) -> ShirtSize {
    labels::shirt_size_from_labels(labels)
        .or_else(|| estimate.map(ShirtSize::from_estimate))
        .unwrap_or(ShirtSize::Missing)
}

fn state_name(state: Option<&str>) -> String {
    state
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_STATE)
        .to_string()
}

fn issue_url(url: Option<&str>, identifier: &str, config: &AnalyticsConfig) -> String {
    match url.filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => config.links.issue_url(identifier),
    }
}

fn parse_timestamp(id: &str, field: &str, value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });
    if parsed.is_none() {
        debug!(issue = %id, field, value, "Ignoring unparseable timestamp");
    }
    parsed
}

fn parse_date(id: &str, field: &str, value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(id, field, trimmed).map(|dt| dt.date_naive()))
}
