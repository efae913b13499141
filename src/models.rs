use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const MAIN_TEAMS: [&str; 4] = ["Comp-leg", "FCP", "LTO", "RPA"];
pub const PGA: &str = "PGA";
pub const ALL_TEAMS: [&str; 5] = ["Comp-leg", "FCP", "LTO", "RPA", "PGA"];
pub const UNASSIGNED: &str = "Unassigned";
pub const UNKNOWN_STATE: &str = "Unknown";

pub fn is_main_team(team: &str) -> bool {
    MAIN_TEAMS.contains(&team)
}

pub fn is_reported_team(team: &str) -> bool {
    ALL_TEAMS.contains(&team)
}

/// One issue as supplied by the fetch collaborator. Never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawIssue {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub due_date: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub completed_at: Option<String>,
    pub trashed: bool,
    pub priority: Option<i64>,
    pub estimate: Option<f64>,
    pub state: Option<String>,
    pub team_name: Option<String>,
    pub team_key: Option<String>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub project: Option<ProjectRef>,
    pub parent_id: Option<String>,
    pub children: Vec<RawChild>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawChild {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub state: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<i64>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    #[serde(rename = "None")]
    NoPriority,
}

impl Priority {
    /// Chart order; every priority chart lists all five in this order.
    pub const ORDER: [Priority; 5] = [
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::NoPriority,
    ];

    pub fn from_level(level: Option<i64>) -> Self {
        match level {
            Some(1) => Priority::Urgent,
            Some(2) => Priority::High,
            Some(3) => Priority::Medium,
            Some(4) => Priority::Low,
            _ => Priority::NoPriority,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::NoPriority => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShirtSize {
    XS,
    S,
    M,
    L,
    XL,
    Missing,
}

impl ShirtSize {
    pub const ALL: [ShirtSize; 6] = [
        ShirtSize::XS,
        ShirtSize::S,
        ShirtSize::M,
        ShirtSize::L,
        ShirtSize::XL,
        ShirtSize::Missing,
    ];

    /// Sizes that can be named by a label, in match order.
    pub const LABELLED: [ShirtSize; 5] = [
        ShirtSize::XS,
        ShirtSize::S,
        ShirtSize::M,
        ShirtSize::L,
        ShirtSize::XL,
    ];

    pub fn weight(&self) -> u32 {
        match self {
            ShirtSize::XS => 1,
            ShirtSize::S => 2,
            ShirtSize::M => 3,
            ShirtSize::L => 5,
            ShirtSize::XL => 8,
            ShirtSize::Missing => 0,
        }
    }

    pub fn from_estimate(estimate: f64) -> Self {
        if estimate <= 1.0 {
            ShirtSize::XS
        } else if estimate <= 2.0 {
            ShirtSize::S
        } else if estimate <= 3.0 {
            ShirtSize::M
        } else if estimate <= 5.0 {
            ShirtSize::L
        } else {
            ShirtSize::XL
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShirtSize::XS => "XS",
            ShirtSize::S => "S",
            ShirtSize::M => "M",
            ShirtSize::L => "L",
            ShirtSize::XL => "XL",
            ShirtSize::Missing => "Missing",
        }
    }
}

/// Organisational group an issue is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    Global,
    #[serde(rename = "Roxom TV")]
    RoxomTv,
    Roxom,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Global => "Global",
            Group::RoxomTv => "Roxom TV",
            Group::Roxom => "Roxom",
        }
    }
}

/// Canonical, normalized issue. Built once per [`RawIssue`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: String,
    pub title: String,
    pub url: String,
    pub team: String,
    /// Team of record: the assignee override wins over `team`.
    pub dashboard_team: String,
    pub group: Option<Group>,
    pub assignee: String,
    pub priority: Priority,
    pub state: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub trashed: bool,
    pub shirt_size: ShirtSize,
    pub labels: Vec<String>,
    pub project: Option<String>,
    pub project_url: Option<String>,
    pub parent_id: Option<String>,
    pub children: Vec<ChildRow>,
}

impl Row {
    pub fn is_unassigned(&self) -> bool {
        self.assignee == UNASSIGNED
    }
}

/// Lightweight summary of an immediate sub-issue.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildRow {
    pub id: String,
    pub title: String,
    pub team: String,
    pub assignee: String,
    pub priority: Priority,
    pub url: String,
    pub state: String,
    pub project_name: Option<String>,
}
