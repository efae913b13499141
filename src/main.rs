use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use issue_analytics::{build_analytics_with, parse_issues, AnalyticsConfig, AnalyticsModel, Clock};

#[derive(Parser)]
#[command(name = "issue-analytics")]
#[command(about = "Issue analytics for the team dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the analytics model and write it as JSON
    Build {
        #[command(flatten)]
        input: InputArgs,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print headline figures
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of issues
    #[arg(long)]
    issues: PathBuf,
    /// TOML file overriding the team and taxonomy tables
    #[arg(long)]
    config: Option<PathBuf>,
    /// Evaluation time (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<String>,
}

impl InputArgs {
    fn analyze(&self) -> anyhow::Result<AnalyticsModel> {
        let config = match &self.config {
            Some(path) => AnalyticsConfig::load(path)?,
            None => AnalyticsConfig::default(),
        };
        let clock = match &self.now {
            Some(raw) => Clock::fixed(parse_now(raw)?),
            None => Clock::system(),
        };
        let issues = read_issues(&self.issues)?;
        Ok(build_analytics_with(&issues, clock, &config))
    }
}

fn parse_now(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("--now must be an RFC 3339 timestamp, got {raw:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn read_issues(path: &Path) -> anyhow::Result<Vec<issue_analytics::RawIssue>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_issues(&raw).with_context(|| format!("failed to decode issues from {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn format_percent(value: Option<u32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}%"))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, out } => {
            let model = input.analyze()?;
            let json = serde_json::to_string_pretty(&model)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Analytics written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Summary { input } => {
            let model = input.analyze()?;
            let stats = &model.summary_stats;
            println!(
                "Open {} | overdue {} | due soon {} | closed {}",
                stats.total_open, stats.overdue, stats.due_soon, stats.total_closed
            );
            println!(
                "Velocity {:.1}/wk (prev {:.1}) | SLA {} (prev {}) | cycle {:.2}d",
                stats.velocity,
                stats.velocity_prev,
                format_percent(stats.sla_compliance),
                format_percent(stats.sla_compliance_prev),
                stats.avg_cycle_time
            );

            if stats.by_team.is_empty() {
                println!("No active issues in reported teams.");
                return Ok(());
            }

            println!("By team:");
            for team in &stats.by_team {
                println!(
                    "- {}: {} open, {} closed, {} overdue, SLA {}",
                    team.team,
                    team.open,
                    team.closed,
                    team.overdue,
                    format_percent(team.sla)
                );
            }
        }
    }

    Ok(())
}
