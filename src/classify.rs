use crate::config::{AnalyticsConfig, StateTaxonomy};
use crate::models::{is_main_team, Row, PGA};

/// Per-row predicates every aggregation stage shares.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Canceled, duplicate, deleted, archived or trashed, by name or by a
    /// delete/trash/restore fragment.
    pub fn is_eliminated_state(&self, state: &str) -> bool {
        let state = state.trim().to_lowercase();
        if state.is_empty() {
            return false;
        }
        let rules = &self.config.elimination;
        rules.states.iter().any(|s| s.to_lowercase() == state)
            || rules
                .substrings
                .iter()
                .any(|fragment| state.contains(&fragment.to_lowercase()))
    }

    pub fn is_eliminated(&self, row: &Row) -> bool {
        row.trashed || self.is_eliminated_state(&row.state)
    }

    /// Base population for every metric: not eliminated and assigned.
    pub fn is_active(&self, row: &Row) -> bool {
        !self.is_eliminated(row) && !row.is_unassigned()
    }

    /// Team of record. An assignee override wins outright; known codes pass
    /// through; anything else goes through the name table.
    pub fn dashboard_team(&self, team: &str, assignee: &str) -> String {
        let teams = &self.config.teams;
        if let Some(code) = teams.team_for_assignee(assignee) {
            return code.to_string();
        }
        if is_main_team(team) || team == PGA {
            return team.to_string();
        }
        teams.code_for_name(team).unwrap_or(team).to_string()
    }

    /// Team a DKR is reported under: the parent's team when it is a main
    /// team, else the override team of the first child whose assignee has
    /// one, else the parent's team anyway.
    pub fn dkr_team(&self, row: &Row) -> String {
        let from_parent = self.dashboard_team(&row.team, &row.assignee);
        if is_main_team(&from_parent) {
            return from_parent;
        }
        row.children
            .iter()
            .find_map(|child| self.config.teams.team_for_assignee(&child.assignee))
            .map(str::to_string)
            .unwrap_or(from_parent)
    }

    pub fn taxonomy(&self, team: &str) -> &'a StateTaxonomy {
        self.config.taxonomy.for_team(team)
    }

    pub fn default_taxonomy(&self) -> &'a StateTaxonomy {
        &self.config.taxonomy.default
    }

    /// Open under the row's own team taxonomy.
    pub fn is_open_for_team(&self, row: &Row) -> bool {
        self.taxonomy(&row.dashboard_team).is_open(&row.state)
    }

    pub fn is_closed_for_team(&self, row: &Row) -> bool {
        self.taxonomy(&row.dashboard_team).is_closed(&row.state)
    }

    pub fn is_open_default(&self, state: &str) -> bool {
        self.default_taxonomy().is_open(state)
    }

    pub fn is_closed_default(&self, state: &str) -> bool {
        self.default_taxonomy().is_closed(state)
    }

    /// Canceled and not trashed. Evaluated on the unfiltered row set.
    pub fn is_canceled(&self, row: &Row) -> bool {
        !row.trashed
            && row
                .state
                .trim()
                .eq_ignore_ascii_case(&self.config.elimination.canceled_state)
    }

    pub fn is_duplicate(&self, row: &Row) -> bool {
        !row.trashed
            && row
                .state
                .trim()
                .eq_ignore_ascii_case(&self.config.elimination.duplicate_state)
    }
}
