//! Tables the engine classifies against.
//!
//! Defaults reproduce the production dashboard; a TOML file may replace any
//! section wholesale.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::PGA;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub teams: TeamDirectory,
    pub taxonomy: TaxonomyConfig,
    pub elimination: EliminationRules,
    pub quality: QualityConfig,
    pub links: LinkConfig,
}

impl AnalyticsConfig {
    pub fn from_toml_str(raw: &str) -> AnalyticsResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> AnalyticsResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| AnalyticsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}

fn table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Team and people lookup tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamDirectory {
    /// Tracker team name to team code.
    pub name_to_code: BTreeMap<String, String>,
    /// Lower-cased assignee name to the team their issues count for.
    pub assignee_teams: BTreeMap<String, String>,
    /// Tracker user name to dashboard label.
    pub display_names: BTreeMap<String, String>,
}

impl Default for TeamDirectory {
    fn default() -> Self {
        Self {
            name_to_code: table(&[
                ("Comp-leg", "Comp-leg"),
                ("Financial Crime Prevention", "FCP"),
                ("Legal Tech Operations", "LTO"),
                ("Regulatory and Public Affairs", "RPA"),
                ("Regulatory Public Affairs", "RPA"),
                ("PGA", "PGA"),
            ]),
            assignee_teams: table(&[
                ("yanina acosta", "FCP"),
                ("yani", "FCP"),
                ("yanina", "FCP"),
                ("guadalupe assorati", "LTO"),
                ("guadalupe", "LTO"),
                ("pasto", "LTO"),
                ("sofita", "RPA"),
                ("sofia", "RPA"),
                ("alfonso martel seward", "RPA"),
                ("alfonso martel", "RPA"),
            ]),
            display_names: table(&[("sofita", "Sofia")]),
        }
    }
}

impl TeamDirectory {
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_code.get(name).map(String::as_str)
    }

    /// Team an assignee's issues are attributed to, ignoring case and
    /// surrounding whitespace.
    pub fn team_for_assignee(&self, assignee: &str) -> Option<&str> {
        self.assignee_teams
            .get(&normalize_key(assignee))
            .map(String::as_str)
    }

    pub fn display_name(&self, name: &str) -> String {
        self.display_names
            .get(name)
            .or_else(|| self.display_names.get(&name.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Open and closed state names for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTaxonomy {
    pub open: Vec<String>,
    pub closed: Vec<String>,
}

impl StateTaxonomy {
    pub fn is_open(&self, state: &str) -> bool {
        contains_state(&self.open, state)
    }

    pub fn is_closed(&self, state: &str) -> bool {
        contains_state(&self.closed, state)
    }
}

fn contains_state(states: &[String], state: &str) -> bool {
    let state = state.trim();
    states.iter().any(|s| s.trim().eq_ignore_ascii_case(state))
}

/// Per-team open/closed taxonomies with a default for every other team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    pub default: StateTaxonomy,
    pub teams: BTreeMap<String, StateTaxonomy>,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        let mut teams = BTreeMap::new();
        teams.insert(
            PGA.to_string(),
            StateTaxonomy {
                open: strings(&["Backlog", "Todo", "In Progress", "Pending Signature"]),
                closed: strings(&["On Going", "Ongoing", "Ended"]),
            },
        );
        Self {
            default: StateTaxonomy {
                open: strings(&["Backlog", "Todo", "In Progress", "In Review", "On Hold"]),
                closed: strings(&["Done"]),
            },
            teams,
        }
    }
}

impl TaxonomyConfig {
    pub fn for_team(&self, team: &str) -> &StateTaxonomy {
        self.teams.get(team).unwrap_or(&self.default)
    }
}

/// States that remove an issue from every metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EliminationRules {
    /// Matched case-insensitively against the whole state name.
    pub states: Vec<String>,
    /// Matched case-insensitively anywhere in the state name.
    pub substrings: Vec<String>,
    pub canceled_state: String,
    pub duplicate_state: String,
}

impl Default for EliminationRules {
    fn default() -> Self {
        Self {
            states: strings(&["Canceled", "Duplicate", "Deleted", "Archived", "Trashed"]),
            substrings: strings(&["delete", "trash", "restore"]),
            canceled_state: "Canceled".to_string(),
            duplicate_state: "Duplicate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Legal-entity labels; an open issue needs one of these.
    pub company_labels: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            company_labels: strings(&[
                "Roxom Ltd",
                "Roxom Markets",
                "Roxom Seychelles",
                "Beat the chain",
                "Prigui",
                "Moxor",
                "Roxom TV Ltd",
                "LL21",
                "Intergalatic Media",
                "21 Dragons",
                "Orange Pill",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub issue_base: String,
    pub project_base: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            issue_base: "https://linear.app/roxom/issue/".to_string(),
            project_base: "https://linear.app/roxom/project/".to_string(),
        }
    }
}

impl LinkConfig {
    pub fn issue_url(&self, identifier: &str) -> String {
        format!("{}{}", self.issue_base, identifier)
    }

    pub fn project_url(&self, slug: &str) -> String {
        format!("{}{}", self.project_base, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pga_has_its_own_taxonomy() {
        let taxonomy = TaxonomyConfig::default();
        let pga = taxonomy.for_team("PGA");
        assert!(pga.is_open("Pending Signature"));
        assert!(pga.is_closed(" ongoing "));
        assert!(!pga.is_closed("Done"));

        let fcp = taxonomy.for_team("FCP");
        assert!(fcp.is_open("on hold"));
        assert!(!fcp.is_open("Pending Signature"));
        assert!(fcp.is_closed("Done"));
    }

    #[test]
    fn assignee_override_ignores_case_and_spaces() {
        let teams = TeamDirectory::default();
        assert_eq!(teams.team_for_assignee("  Yanina Acosta "), Some("FCP"));
        assert_eq!(teams.team_for_assignee("Someone Else"), None);
    }

    #[test]
    fn display_names_fall_back_to_input() {
        let teams = TeamDirectory::default();
        assert_eq!(teams.display_name("sofita"), "Sofia");
        assert_eq!(teams.display_name("Sofita"), "Sofia");
        assert_eq!(teams.display_name("Marta"), "Marta");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AnalyticsConfig::from_toml_str(
            r#"
            [quality]
            company_labels = ["Acme"]

            [taxonomy.teams.LTO]
            open = ["Drafting"]
            closed = ["Signed"]
            "#,
        )
        .unwrap();
        assert_eq!(config.quality.company_labels, vec!["Acme".to_string()]);
        assert!(config.taxonomy.for_team("LTO").is_closed("signed"));
        assert!(config.taxonomy.for_team("FCP").is_closed("Done"));
        assert_eq!(config.teams, TeamDirectory::default());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = AnalyticsConfig::from_toml_str("teams = 3").unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(_)));
    }
}
