use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use crate::util;
use crate::window::{parse_as_of, AnalysisWindow};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseSourceKind {
  /// GitHub REST API (also resolves renamed repositories)
  Github,
  /// The datastore's releases table
  Datastore,
}

#[derive(Parser, Debug)]
#[command(
    name = "project-health",
    version,
    about = "Starter project health metrics (release frequency, closure ratio, bus factor, first response) from an Augur datastore",
    long_about = None
)]
pub struct Cli {
  /// GitHub organization (Augur repo group) to report on
  #[arg(short = 'o', long)]
  pub org: Option<String>,

  /// Single repository in the org (default: every repository in the org)
  #[arg(short = 'r', long)]
  pub repo: Option<String>,

  /// Whole years of history to analyze
  #[arg(short = 'y', long, default_value_t = 1)]
  pub years: u32,

  /// Business days a PR may wait for its first response
  #[arg(long, default_value_t = 2)]
  pub business_days: u32,

  /// Augur config.json with datastore connection details
  #[arg(short = 'c', long)]
  pub config: Option<PathBuf>,

  /// Root directory for charts and summaries
  #[arg(long, default_value = "output")]
  pub out: PathBuf,

  /// File whose first line is a GitHub token (default: GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
  #[arg(long)]
  pub gh_key: Option<PathBuf>,

  /// Where release timestamps come from
  #[arg(long, value_enum, default_value_t = ReleaseSourceKind::Github)]
  pub release_source: ReleaseSourceKind,

  /// Extra commit author-name patterns to ignore (SQL LIKE syntax; repeatable)
  #[arg(long = "bot-pattern")]
  pub bot_patterns: Vec<String>,

  /// Compute and print summaries without writing chart images
  #[arg(long)]
  pub no_charts: bool,

  /// More diagnostics on stderr (-v info, -vv debug)
  #[arg(short = 'v', long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Fixed "today" (YYYY-MM-DD) for reproducible runs (hidden; tests only)
  #[arg(long, hide = true)]
  pub as_of: Option<String>,

  /// Read a JSON fixture datastore instead of Postgres (hidden; tests only)
  #[arg(long, hide = true)]
  pub fixture: Option<PathBuf>,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DatastoreSpec {
  Postgres { config: String },
  Fixture { path: String },
}

#[derive(Debug, Serialize)]
pub struct EffectiveConfig {
  pub org: String,
  pub repo: Option<String>,
  pub years: u32,
  pub business_days: u32,
  pub datastore: DatastoreSpec,
  pub out: PathBuf,
  pub gh_key: Option<PathBuf>,
  pub release_source: ReleaseSourceKind,
  pub bot_patterns: Vec<String>,
  pub charts: bool,
  /// The day the run pretends it is.
  pub as_of: NaiveDate,
}

impl EffectiveConfig {
  /// Whole-org runs also write the CSV summary.
  pub fn whole_org(&self) -> bool {
    self.repo.is_none()
  }
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let Some(org) = cli.org.filter(|o| !o.trim().is_empty()) else {
    bail!("--org is required")
  };

  if cli.years == 0 {
    bail!("--years must be at least 1");
  }
  if cli.business_days == 0 {
    bail!("--business-days must be at least 1");
  }

  let datastore = match (&cli.config, &cli.fixture) {
    (Some(c), None) => DatastoreSpec::Postgres {
      config: util::canonicalize_lossy(c),
    },
    (None, Some(f)) => DatastoreSpec::Fixture {
      path: util::canonicalize_lossy(f),
    },
    (None, None) => bail!("Provide a datastore with --config <config.json>"),
    (Some(_), Some(_)) => bail!("Choose only one of --config | --fixture"),
  };

  let as_of = match cli.as_of.as_deref() {
    Some(raw) => parse_as_of(raw)?,
    None => chrono::Local::now().date_naive(),
  };
  // reject lookbacks that leave the calendar before any datastore work
  AnalysisWindow::for_years(as_of, cli.years)?;

  Ok(EffectiveConfig {
    org,
    repo: cli.repo.filter(|r| !r.trim().is_empty()),
    years: cli.years,
    business_days: cli.business_days,
    datastore,
    out: cli.out,
    gh_key: cli.gh_key,
    release_source: cli.release_source,
    bot_patterns: cli.bot_patterns,
    charts: !cli.no_charts,
    as_of,
  })
}
