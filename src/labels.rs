//! Label and title heuristics.
//!
//! Every probe the engine makes against free-text labels, project names or
//! titles lives here as a pure function over a label list, so each rule can
//! be checked against a literal fixture.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Group, ShirtSize};

static DKR_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)DKR\s*(\d+)").expect("DKR_TITLE regex should compile"));

static OKR_PROJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)OKR\s*([123])\b").expect("OKR_PROJECT regex should compile"));

fn lowered(labels: &[String]) -> impl Iterator<Item = String> + '_ {
    labels.iter().map(|l| l.trim().to_lowercase())
}

/// Shirt size named by a label: the bare code, `Shirt Size: <code>` or any
/// `: <code>` suffix. Sizes are tried XS, S, M, L, XL; first hit wins.
pub fn shirt_size_from_labels(labels: &[String]) -> Option<ShirtSize> {
    let labels: Vec<String> = lowered(labels).collect();
    ShirtSize::LABELLED.into_iter().find(|size| {
        let code = size.as_str().to_lowercase();
        let prefixed = format!("shirt size: {code}");
        let suffixed = format!(": {code}");
        labels
            .iter()
            .any(|l| *l == code || l.contains(&prefixed) || l.contains(&suffixed))
    })
}

/// Group tag, most specific first: Roxom Global, Roxom TV, then plain Roxom.
pub fn classify_group(labels: &[String]) -> Option<Group> {
    let labels: Vec<String> = lowered(labels).collect();
    if labels.iter().any(|l| l.contains("roxom global")) {
        return Some(Group::Global);
    }
    if labels.iter().any(|l| l.contains("roxom tv")) {
        return Some(Group::RoxomTv);
    }
    let plain_roxom = labels.iter().any(|l| {
        *l == "roxom"
            || (l.contains("group")
                && l.contains("roxom")
                && !l.contains("roxom tv")
                && !l.contains("roxom global"))
    });
    plain_roxom.then_some(Group::Roxom)
}

/// True when any label names one of the legal entities in `companies`.
pub fn has_company_label(labels: &[String], companies: &[String]) -> bool {
    let companies: Vec<String> = companies.iter().map(|c| c.to_lowercase()).collect();
    lowered(labels).any(|l| companies.iter().any(|c| l.contains(c.as_str())))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkType {
    #[serde(rename = "OKRs")]
    Okrs,
    #[serde(rename = "BAU")]
    Bau,
    Unclassified,
}

impl WorkType {
    pub const ORDER: [WorkType; 3] = [WorkType::Okrs, WorkType::Bau, WorkType::Unclassified];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::Okrs => "OKRs",
            WorkType::Bau => "BAU",
            WorkType::Unclassified => "Unclassified",
        }
    }
}

/// Work types an issue counts toward. OKR and BAU are not exclusive; an
/// issue with neither is `Unclassified`.
pub fn work_types(labels: &[String]) -> Vec<WorkType> {
    let labels: Vec<String> = lowered(labels).collect();
    let mut types = Vec::new();
    if labels.iter().any(|l| l.contains("okr")) {
        types.push(WorkType::Okrs);
    }
    if labels.iter().any(|l| l.contains("bau")) {
        types.push(WorkType::Bau);
    }
    if types.is_empty() {
        types.push(WorkType::Unclassified);
    }
    types
}

pub fn has_work_type(labels: &[String]) -> bool {
    !work_types(labels).contains(&WorkType::Unclassified)
}

pub fn is_dkr_title(title: &str) -> bool {
    DKR_TITLE.is_match(title)
}

/// Number carried by a `DKR <n>` title; `None` when absent or too large.
pub fn dkr_number(title: &str) -> Option<u32> {
    DKR_TITLE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// OKR bucket (1..=3) named by a project, e.g. `"OKR 2 - Licensing"`.
pub fn okr_number(project_name: &str) -> Option<u8> {
    OKR_PROJECT
        .captures(project_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
