// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate a run: resolve repositories, run the four facades per repo, print report lines, write the org CSV
// role: processing/orchestrator
// inputs: EffectiveConfig; Datastore, ReleaseSource and ChartRenderer collaborators
// outputs: Report lines on stdout; charts and <org>_health_summary.csv under the artifact root
// side_effects: Creates artifact directories; writes PNG/CSV files; prints to stdout
// invariants:
// - Repositories are processed one at a time; metrics run in order release, closure, bus factor, first response
// - An unknown single repository is fatal before any work starts
// - RateLimited aborts the whole run; every other metric error prints one skip line and processing continues
// - Any other repository-level failure prints one skip line, leaves an empty CSV row and moves to the next repository
// - The CSV is written only for whole-org runs
// errors: Fatal conditions surface as anyhow errors with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;

use anyhow::{bail, Context, Result};

use crate::artifacts::ArtifactLocation;
use crate::chart::{ChartRenderer, NullRenderer, PlottersRenderer};
use crate::cli::{DatastoreSpec, EffectiveConfig, ReleaseSourceKind};
use crate::config::{BotDenylist, DatastoreConfig, HealthModel};
use crate::datastore::{Datastore, RepoRef};
use crate::error::{HealthError, HealthResult};
use crate::fixture::FixtureStore;
use crate::github::{discover_token, DatastoreReleases, GithubHttpApi, ReleaseSource};
use crate::metrics::{self, MetricContext, MetricReport};
use crate::postgres::PostgresStore;
use crate::report::{write_summary, SummaryRow};
use crate::util::flag_label;
use crate::window::AnalysisWindow;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Metric {
  ReleaseFrequency,
  ClosureRatio,
  BusFactor,
  FirstResponse,
}

const METRICS: [Metric; 4] = [
  Metric::ReleaseFrequency,
  Metric::ClosureRatio,
  Metric::BusFactor,
  Metric::FirstResponse,
];

impl Metric {
  fn label(self) -> &'static str {
    match self {
      Metric::ReleaseFrequency => "Activity Release",
      Metric::ClosureRatio => "Closure Ratio",
      Metric::BusFactor => "Bus Factor / Contributor Risk",
      Metric::FirstResponse => "Time to First Response",
    }
  }
}

/// Repositories named by the invocation; a single unknown repository is fatal.
pub fn resolve_targets(store: &dyn Datastore, org: &str, repo: Option<&str>) -> Result<Vec<RepoRef>> {
  match repo {
    Some(name) => match store.resolve_repo(org, name)? {
      Some(r) => Ok(vec![r]),
      None => bail!("Invalid org/repo combination: {org}/{name} does not match exactly one repository"),
    },
    None => {
      let repos = store.org_repos(org)?;
      if repos.is_empty() {
        bail!("No repositories found for org {org}");
      }
      Ok(repos)
    }
  }
}

pub struct Runner<'a> {
  pub store: &'a dyn Datastore,
  pub releases: &'a dyn ReleaseSource,
  pub renderer: &'a dyn ChartRenderer,
  pub model: &'a HealthModel,
  pub denylist: &'a BotDenylist,
  pub window: AnalysisWindow,
  pub artifacts: ArtifactLocation,
  pub years: u32,
  pub charts: bool,
  pub out: &'a mut dyn Write,
}

impl Runner<'_> {
  /// Process every target in order; stops at the first fatal error.
  ///
  /// A repository that fails for any other reason keeps an empty summary row.
  pub fn run(&mut self, targets: &[RepoRef]) -> Result<Vec<SummaryRow>> {
    let mut rows = Vec::with_capacity(targets.len());

    for repo in targets {
      match self.process_repo(repo) {
        Ok(row) => rows.push(row),
        Err(e) if e.is_fatal() => {
          return Err(e).with_context(|| format!("aborting run at {}", repo.full_name()));
        }
        Err(e) => {
          tracing::warn!(repo = %repo.full_name(), error = %e, "repository skipped");
          writeln!(self.out, "{} skipped: {}", repo.full_name(), e)?;
          rows.push(SummaryRow::new(&repo.org, &repo.name));
        }
      }
    }

    Ok(rows)
  }

  fn process_repo(&mut self, repo: &RepoRef) -> HealthResult<SummaryRow> {
    tracing::info!(repo = %repo.full_name(), window = %self.window, "processing repository");

    let flags = self.store.repo_flags(repo)?;
    writeln!(self.out, "\n{}", repo.full_name())?;
    writeln!(self.out, "Forked: {}\nArchived: {}", flag_label(Some(flags.is_fork)), flag_label(flags.is_archived))?;

    let canonical = match self.releases.canonical_name(repo) {
      Ok(c) => c,
      Err(e) if e.is_fatal() => return Err(e),
      Err(e) => {
        tracing::warn!(repo = %repo.full_name(), error = %e, "could not confirm canonical name; using datastore name");
        repo.clone()
      }
    };

    if self.charts {
      self.artifacts.ensure_dir(&canonical)?;
    }

    let mut row = SummaryRow::new(&canonical.org, &canonical.name);
    row.is_fork = Some(flags.is_fork);
    row.is_archived = flags.is_archived;

    for metric in METRICS {
      match self.run_metric(metric, &canonical) {
        Ok(report) => {
          self.print_report(metric, &canonical, &report)?;
          report.fragment.apply(&mut row);
        }
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
          tracing::debug!(metric = metric.label(), error = ?e, "metric skipped");
          writeln!(self.out, "{} skipped: {}", metric.label(), e)?;
        }
      }
    }

    Ok(row)
  }

  fn run_metric(&self, metric: Metric, repo: &RepoRef) -> HealthResult<MetricReport> {
    let ctx = MetricContext {
      repo,
      window: &self.window,
      model: self.model,
      years: self.years,
      artifacts: &self.artifacts,
      renderer: self.renderer,
    };

    match metric {
      Metric::ReleaseFrequency => metrics::release_frequency::run(&ctx, self.releases),
      Metric::ClosureRatio => metrics::closure_ratio::run(&ctx, self.store),
      Metric::BusFactor => metrics::bus_factor::run(&ctx, self.store, self.denylist),
      Metric::FirstResponse => metrics::first_response::run(&ctx, self.store),
    }
  }

  fn print_report(&mut self, metric: Metric, repo: &RepoRef, report: &MetricReport) -> std::io::Result<()> {
    writeln!(
      self.out,
      "\n{} for {} from {} to {}",
      metric.label(),
      repo.full_name(),
      self.window.start(),
      self.window.last_day()
    )?;
    if let Some(path) = &report.chart {
      writeln!(self.out, "saved as {}", path.display())?;
    }
    writeln!(self.out, "{}", report.summary)
  }
}

/// Build the collaborators named by `cfg` and run to completion.
pub fn execute(cfg: &EffectiveConfig) -> Result<()> {
  let store: Box<dyn Datastore> = match &cfg.datastore {
    DatastoreSpec::Postgres { config } => {
      let ds = DatastoreConfig::load(std::path::Path::new(config))?;
      Box::new(PostgresStore::connect(&ds).context("connecting to the datastore")?)
    }
    DatastoreSpec::Fixture { path } => Box::new(FixtureStore::load(std::path::Path::new(path))?),
  };

  let github;
  let from_store;
  let releases: &dyn ReleaseSource = match cfg.release_source {
    ReleaseSourceKind::Github => {
      let token = discover_token(cfg.gh_key.as_deref())?;
      if token.is_none() {
        tracing::warn!("no GitHub token found; unauthenticated requests are heavily rate limited");
      }
      github = GithubHttpApi::new(token);
      &github
    }
    ReleaseSourceKind::Datastore => {
      from_store = DatastoreReleases::new(store.as_ref());
      &from_store
    }
  };

  let renderer: Box<dyn ChartRenderer> = if cfg.charts {
    Box::new(PlottersRenderer)
  } else {
    Box::new(NullRenderer)
  };

  let model = HealthModel {
    business_days: cfg.business_days,
    ..HealthModel::default()
  };
  let denylist = BotDenylist::with_extra(cfg.bot_patterns.iter().cloned()).context("compiling --bot-pattern")?;
  let window = AnalysisWindow::for_years(cfg.as_of, cfg.years)?;
  let artifacts = ArtifactLocation::new(&cfg.out, window.report_month(), &cfg.org);

  let targets = resolve_targets(store.as_ref(), &cfg.org, cfg.repo.as_deref())?;
  tracing::info!(org = %cfg.org, repos = targets.len(), window = %window, "starting run");

  let stdout = std::io::stdout();
  let mut lock = stdout.lock();
  let mut runner = Runner {
    store: store.as_ref(),
    releases,
    renderer: renderer.as_ref(),
    model: &model,
    denylist: &denylist,
    window,
    artifacts,
    years: cfg.years,
    charts: cfg.charts,
    out: &mut lock,
  };
  let rows = runner.run(&targets)?;

  if cfg.whole_org() {
    let path = runner.artifacts.summary_path();
    write_summary(&path, &rows)?;
    writeln!(runner.out, "\nSummary for {} written to {}", cfg.org, path.display())?;
  }

  Ok(())
}
