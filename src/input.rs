//! Decoding of the issue collection handed over by the fetch collaborator.
//!
//! Two shapes are accepted: the nested tracker node shape (`state{name}`,
//! `team{key,name}`, `labels{nodes}` ...) and the flat pre-fetched shape
//! (`status`, `team` and `assignee` as strings). Optional fields decode
//! leniently; a malformed value is treated as absent.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::{ProjectRef, RawChild, RawIssue};

/// Parses a JSON array of issue records. Fails only when the document is
/// not an array of objects.
pub fn parse_issues(json: &str) -> AnalyticsResult<Vec<RawIssue>> {
    let value: Value = serde_json::from_str(json)?;
    issues_from_value(value)
}

pub fn issues_from_value(value: Value) -> AnalyticsResult<Vec<RawIssue>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(AnalyticsError::InvalidInput(format!(
                "expected an array of issues, found {}",
                kind(&other)
            )))
        }
    };

    let mut issues = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(AnalyticsError::InvalidInput(format!(
                "issue {index} is {}, expected an object",
                kind(&item)
            )));
        }
        let wire: WireIssue = serde_json::from_value(item)?;
        issues.push(wire.into_raw());
    }
    debug!(count = issues.len(), "Decoded issue collection");
    Ok(issues)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes `T` when possible and yields `None` for absent, null or
/// mistyped values.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIssue {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    identifier: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    completed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    trashed: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    trashed_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    priority: Option<PriorityField>,
    #[serde(default, deserialize_with = "lenient")]
    estimate: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    state: Option<NamedField>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    team: Option<TeamField>,
    #[serde(default, deserialize_with = "lenient")]
    assignee: Option<NamedField>,
    #[serde(default, deserialize_with = "lenient")]
    labels: Option<NodeList>,
    #[serde(default, deserialize_with = "lenient")]
    project: Option<ProjectField>,
    #[serde(default, deserialize_with = "lenient")]
    parent: Option<IdField>,
    #[serde(default, deserialize_with = "lenient")]
    parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    children: Option<NodeList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChild {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    identifier: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    state: Option<NamedField>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    assignee: Option<NamedField>,
    #[serde(default, deserialize_with = "lenient")]
    priority: Option<PriorityField>,
    #[serde(default, deserialize_with = "lenient")]
    project: Option<ProjectField>,
}

/// `"Todo"` or `{"name": "Todo"}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NamedField {
    Plain(String),
    Named { name: Option<String> },
}

impl NamedField {
    fn into_name(self) -> Option<String> {
        match self {
            NamedField::Plain(name) => Some(name),
            NamedField::Named { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeamField {
    Plain(String),
    Node {
        key: Option<String>,
        name: Option<String>,
    },
}

/// `3` or `{"value": 3}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriorityField {
    Level(i64),
    Value { value: Option<i64> },
}

impl PriorityField {
    fn level(self) -> Option<i64> {
        match self {
            PriorityField::Level(level) => Some(level),
            PriorityField::Value { value } => value,
        }
    }
}

/// A connection (`{"nodes": [...]}`) or a bare list. Elements are decoded
/// one by one so a single bad element does not drop its siblings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeList {
    Connection { nodes: Vec<Value> },
    List(Vec<Value>),
}

impl NodeList {
    fn into_nodes(self) -> Vec<Value> {
        match self {
            NodeList::Connection { nodes } => nodes,
            NodeList::List(nodes) => nodes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProjectField {
    Name(String),
    Node {
        #[serde(default, deserialize_with = "lenient")]
        id: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        name: Option<String>,
        #[serde(default, rename = "slugId", deserialize_with = "lenient")]
        slug_id: Option<String>,
    },
}

impl ProjectField {
    fn into_project(self) -> ProjectRef {
        match self {
            ProjectField::Name(name) => ProjectRef {
                name: Some(name),
                ..ProjectRef::default()
            },
            ProjectField::Node { id, name, slug_id } => ProjectRef {
                id,
                name,
                slug: slug_id,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdField {
    id: Option<String>,
}

fn human_id(identifier: Option<String>, id: Option<String>) -> String {
    identifier
        .filter(|s| !s.is_empty())
        .or(id)
        .unwrap_or_default()
}

fn state_of(state: Option<NamedField>, status: Option<String>) -> Option<String> {
    status.or_else(|| state.and_then(NamedField::into_name))
}

fn label_name(value: Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name),
        Value::Object(mut fields) => match fields.remove("name") {
            Some(Value::String(name)) => Some(name),
            _ => None,
        },
        _ => None,
    }
}

impl WireIssue {
    fn into_raw(self) -> RawIssue {
        let (team_name, team_key) = match self.team {
            Some(TeamField::Plain(name)) => (Some(name), None),
            Some(TeamField::Node { key, name }) => (name, key),
            None => (None, None),
        };
        let children = self
            .children
            .map(NodeList::into_nodes)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|node| serde_json::from_value::<WireChild>(node).ok())
            .map(WireChild::into_raw)
            .collect();

        RawIssue {
            id: human_id(self.identifier, self.id),
            title: self.title.unwrap_or_default(),
            url: self.url,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            trashed: self.trashed.unwrap_or(false) || self.trashed_at.is_some(),
            priority: self.priority.and_then(PriorityField::level),
            estimate: self.estimate,
            state: state_of(self.state, self.status),
            team_name,
            team_key,
            assignee: self.assignee.and_then(NamedField::into_name),
            labels: self
                .labels
                .map(NodeList::into_nodes)
                .unwrap_or_default()
                .into_iter()
                .filter_map(label_name)
                .collect(),
            project: self.project.map(ProjectField::into_project),
            parent_id: self.parent.and_then(|p| p.id).or(self.parent_id),
            children,
        }
    }
}

impl WireChild {
    fn into_raw(self) -> RawChild {
        RawChild {
            id: human_id(self.identifier, self.id),
            title: self.title.unwrap_or_default(),
            url: self.url,
            state: state_of(self.state, self.status),
            assignee: self.assignee.and_then(NamedField::into_name),
            priority: self.priority.and_then(PriorityField::level),
            project_name: self
                .project
                .map(ProjectField::into_project)
                .and_then(|p| p.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_tracker_node_shape() {
        let json = r#"[{
            "id": "6f1c",
            "identifier": "FCP-12",
            "title": "DKR 2 - Screening",
            "url": "https://linear.app/roxom/issue/FCP-12",
            "dueDate": "2026-03-01",
            "createdAt": "2026-01-10T09:00:00.000Z",
            "completedAt": null,
            "trashed": false,
            "priority": 2,
            "estimate": 3,
            "state": {"name": "In Progress", "type": "started"},
            "team": {"key": "FCP", "name": "Financial Crime Prevention", "id": "t1"},
            "assignee": {"name": "yani"},
            "labels": {"nodes": [{"name": "OKRs"}, {"name": "Shirt Size: M"}]},
            "project": {"id": "p1", "name": "OKR 2 - Screening", "slugId": "abc123"},
            "parent": null,
            "children": {"nodes": [
                {"id": "c1", "identifier": "FCP-13", "title": "Vendor review",
                 "state": {"name": "Done"}, "assignee": {"name": "Marta"},
                 "priority": 3, "project": {"name": "OKR 2 - Screening"}}
            ]}
        }]"#;
        let issues = parse_issues(json).unwrap();
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];

        assert_eq!(issue.id, "FCP-12");
        assert_eq!(issue.state.as_deref(), Some("In Progress"));
        assert_eq!(issue.team_name.as_deref(), Some("Financial Crime Prevention"));
        assert_eq!(issue.team_key.as_deref(), Some("FCP"));
        assert_eq!(issue.assignee.as_deref(), Some("yani"));
        assert_eq!(issue.priority, Some(2));
        assert_eq!(issue.estimate, Some(3.0));
        assert_eq!(issue.labels, vec!["OKRs", "Shirt Size: M"]);
        assert_eq!(
            issue.project,
            Some(ProjectRef {
                id: Some("p1".to_string()),
                name: Some("OKR 2 - Screening".to_string()),
                slug: Some("abc123".to_string()),
            })
        );
        assert_eq!(issue.completed_at, None);
        assert_eq!(issue.parent_id, None);
        assert_eq!(
            issue.children,
            vec![RawChild {
                id: "FCP-13".to_string(),
                title: "Vendor review".to_string(),
                url: None,
                state: Some("Done".to_string()),
                assignee: Some("Marta".to_string()),
                priority: Some(3),
                project_name: Some("OKR 2 - Screening".to_string()),
            }]
        );
    }

    #[test]
    fn decodes_flat_prefetched_shape() {
        let json = r#"[{
            "id": "LTO-4",
            "title": "Contract template",
            "status": "Todo",
            "team": "Legal Tech Operations",
            "assignee": "guadalupe",
            "labels": ["BAU", {"name": "Roxom Ltd"}, 7],
            "priority": {"value": 4, "name": "Low"},
            "trashedAt": "2026-02-01T00:00:00Z",
            "parentId": "LTO-1"
        }]"#;
        let issue = &parse_issues(json).unwrap()[0];

        assert_eq!(issue.id, "LTO-4");
        assert_eq!(issue.state.as_deref(), Some("Todo"));
        assert_eq!(issue.team_name.as_deref(), Some("Legal Tech Operations"));
        assert_eq!(issue.team_key, None);
        assert_eq!(issue.assignee.as_deref(), Some("guadalupe"));
        assert_eq!(issue.labels, vec!["BAU", "Roxom Ltd"]);
        assert_eq!(issue.priority, Some(4));
        assert!(issue.trashed);
        assert_eq!(issue.parent_id.as_deref(), Some("LTO-1"));
    }

    #[test]
    fn malformed_optional_fields_become_absent() {
        let json = r#"[{
            "identifier": "RPA-9",
            "title": 42,
            "dueDate": 20260301,
            "priority": "urgent",
            "estimate": "large",
            "state": 7,
            "assignee": null,
            "labels": "OKRs",
            "children": {"nodes": [7, {"identifier": "RPA-10", "title": "Filing"}]}
        }]"#;
        let issue = &parse_issues(json).unwrap()[0];

        assert_eq!(issue.id, "RPA-9");
        assert_eq!(issue.title, "");
        assert_eq!(issue.due_date, None);
        assert_eq!(issue.priority, None);
        assert_eq!(issue.estimate, None);
        assert_eq!(issue.state, None);
        assert_eq!(issue.assignee, None);
        assert!(issue.labels.is_empty());
        assert_eq!(issue.children.len(), 1);
        assert_eq!(issue.children[0].id, "RPA-10");
    }

    #[test]
    fn rejects_collections_that_are_not_arrays_of_objects() {
        let err = parse_issues(r#"{"issues": []}"#).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
        assert!(err.to_string().contains("an object"));

        let err = parse_issues(r#"[{"id": "A-1"}, "A-2"]"#).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
        assert!(err.to_string().contains("issue 1"));

        let err = parse_issues("not json").unwrap_err();
        assert!(matches!(err, AnalyticsError::Json(_)));
    }

    #[test]
    fn empty_collection_is_valid() {
        assert!(parse_issues("[]").unwrap().is_empty());
    }
}
