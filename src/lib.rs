//! Issue analytics core.
//!
//! Turns a flat collection of tracker issues into the nested analytics model
//! a reporting surface renders: team and assignee rollups, the OKR/DKR
//! rollup, weekly trends and data-quality scores.
//!
//! ```no_run
//! use issue_analytics::{build_analytics, parse_issues};
//!
//! let issues = parse_issues(&std::fs::read_to_string("issues.json")?)?;
//! let model = build_analytics(&issues, chrono::Utc::now());
//! println!("{}", model.summary_stats.total_open);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aggregate;
pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod labels;
pub mod models;
pub mod normalize;
pub mod output;

pub use aggregate::{build_analytics, build_analytics_with};
pub use clock::Clock;
pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, AnalyticsResult};
pub use input::parse_issues;
pub use models::RawIssue;
pub use output::AnalyticsModel;
