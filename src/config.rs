// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Datastore connection descriptor, health-model thresholds and the author-name denylist
// role: configuration
// inputs: Augur-style config.json; CLI-supplied extra denylist patterns
// outputs: DatastoreConfig (→ PgConnectOptions), HealthModel, BotDenylist
// invariants:
// - schema defaults to augur_data and becomes the connection search_path; sessions run in UTC
// - denylist patterns use SQL LIKE syntax and match case-sensitively against the whole name
// errors: Unreadable or malformed config files surface with the path in context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

use crate::trend::TrendWindows;

fn default_schema() -> String {
  "augur_data".to_string()
}

fn default_port() -> u16 {
  5432
}

/// Connection settings read from the datastore's `config.json`.
#[derive(Clone, Debug, Deserialize)]
pub struct DatastoreConfig {
  pub user: String,
  #[serde(default)]
  pub password: String,
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  pub database: String,
  #[serde(default = "default_schema")]
  pub schema: String,
  /// login or email → canonical login
  #[serde(default)]
  pub identity_aliases: HashMap<String, String>,
}

impl DatastoreConfig {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading datastore config {}", path.display()))?;

    serde_json::from_str(&raw).with_context(|| format!("parsing datastore config {}", path.display()))
  }

  pub fn connect_options(&self) -> PgConnectOptions {
    PgConnectOptions::new()
      .host(&self.host)
      .port(self.port)
      .username(&self.user)
      .password(&self.password)
      .database(&self.database)
      .options([("search_path", self.schema.as_str()), ("timezone", "UTC")])
  }
}

/// Fixed thresholds of the health model.
#[derive(Clone, Debug, PartialEq)]
pub struct HealthModel {
  pub closure_gap_threshold: f64,
  pub response_gap_threshold: f64,
  pub min_prs: u64,
  pub bus_factor_share: f64,
  pub bus_factor_cap: usize,
  pub breach_months: usize,
  pub trend: TrendWindows,
  pub release_lookback_days: i64,
  pub business_days: u32,
  /// Axis label wrap width for contributor names.
  pub name_wrap: usize,
}

impl Default for HealthModel {
  fn default() -> Self {
    Self {
      closure_gap_threshold: 0.15,
      response_gap_threshold: 0.15,
      min_prs: 24,
      bus_factor_share: crate::contributors::BUS_FACTOR_SHARE,
      bus_factor_cap: crate::contributors::BUS_FACTOR_CAP,
      breach_months: 6,
      trend: TrendWindows::default(),
      release_lookback_days: 180,
      business_days: 2,
      name_wrap: 15,
    }
  }
}

pub const DEFAULT_BOT_PATTERNS: &[&str] = &[
  "snyk%",
  "%bot",
  "%Bot",
  "%BOT",
  "dependabot%",
  "gerrit%",
  "%utomation%",
  "%ipeline%",
  "Travis CI",
];

static DEFAULT_DENYLIST: Lazy<BotDenylist> = Lazy::new(|| {
  BotDenylist::new(DEFAULT_BOT_PATTERNS.iter().map(|s| s.to_string())).expect("built-in patterns compile")
});

/// Author-name denylist written in SQL `LIKE` syntax (`%` any run, `_` one char).
#[derive(Clone, Debug)]
pub struct BotDenylist {
  patterns: Vec<String>,
  compiled: Vec<Regex>,
}

fn like_to_regex(pattern: &str) -> String {
  let mut re = String::from("^");
  let mut buf = [0u8; 4];

  for ch in pattern.chars() {
    match ch {
      '%' => re.push_str(".*"),
      '_' => re.push('.'),
      c => re.push_str(&regex::escape(c.encode_utf8(&mut buf))),
    }
  }
  re.push('$');

  re
}

impl BotDenylist {
  pub fn new<I: IntoIterator<Item = String>>(patterns: I) -> Result<Self, regex::Error> {
    let patterns: Vec<String> = patterns.into_iter().collect();
    let compiled = patterns
      .iter()
      .map(|p| Regex::new(&like_to_regex(p)))
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { patterns, compiled })
  }

  /// Built-in patterns extended with `extra`.
  pub fn with_extra<I: IntoIterator<Item = String>>(extra: I) -> Result<Self, regex::Error> {
    Self::new(DEFAULT_BOT_PATTERNS.iter().map(|s| s.to_string()).chain(extra))
  }

  /// Raw LIKE patterns, bound as query parameters by the Postgres adapter.
  pub fn patterns(&self) -> &[String] {
    &self.patterns
  }

  pub fn is_denied(&self, author_name: &str) -> bool {
    self.compiled.iter().any(|re| re.is_match(author_name))
  }
}

impl Default for BotDenylist {
  fn default() -> Self {
    DEFAULT_DENYLIST.clone()
  }
}

/// Comment authors with the `[bot]` login suffix never count as first responders.
pub fn is_bot_login(login: &str) -> bool {
  login.ends_with("[bot]")
}
