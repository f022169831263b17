use crate::artifacts::ChartKind;
use crate::chart::BarChart;
use crate::config::{BotDenylist, HealthModel};
use crate::contributors::{bus_factor, rank_contributors, wrap_name, AuthorCommits, BusFactor, IdentityResolver};
use crate::datastore::Datastore;
use crate::error::{HealthError, HealthResult};

use super::{percent, CsvFragment, MetricContext, MetricReport};

pub const INTERPRETATION: &str = "Interpretation: Healthy projects should have enough people making commits to\nsustain the project even if a top contributor leaves.";

/// Merge identities, rank, and find the bus factor.
pub fn analyze(rows: Vec<AuthorCommits>, resolver: &dyn IdentityResolver, model: &HealthModel) -> HealthResult<BusFactor> {
  let merged = resolver.merge_identities(rows);
  let ranked = rank_contributors(merged);

  bus_factor(&ranked, model.bus_factor_share, model.bus_factor_cap).ok_or_else(HealthError::no_data)
}

/// Shares joined with `--`, the way the summary CSV stores them.
pub fn join_shares(factor: &BusFactor) -> String {
  factor
    .top
    .iter()
    .map(|c| c.commit_share.to_string())
    .collect::<Vec<_>>()
    .join("--")
}

pub fn run(ctx: &MetricContext<'_>, store: &dyn Datastore, denylist: &BotDenylist) -> HealthResult<MetricReport> {
  let rows = store.author_commits(ctx.repo.id, ctx.window, denylist)?;
  let resolver = store.identity_resolver();
  let factor = analyze(rows, &resolver, ctx.model)?;

  tracing::debug!(repo = %ctx.repo.full_name(), num_people = factor.num_people, shown = factor.top.len(), "bus factor");

  let title = format!(
    "{}\nContributor Risk for commits from {} to {}: ",
    ctx.heading(),
    ctx.window.start(),
    ctx.window.last_day()
  );

  let chart = BarChart {
    title: title.clone(),
    caption: format!("Key Contributors\n\n{INTERPRETATION}"),
    labels: factor.top.iter().map(|c| wrap_name(&c.display_name, ctx.model.name_wrap)).collect(),
    values: factor.top.iter().map(|c| c.commit_count).collect(),
    annotations: factor.top.iter().map(|c| percent(c.commit_share)).collect(),
    y_label: "Commits".into(),
  };
  let path = ctx.artifacts.chart_path(ctx.repo, ChartKind::BusFactor { years: ctx.years });
  let written = ctx.renderer.bar_chart(&chart, &path)?;

  Ok(MetricReport {
    title,
    interpretation: INTERPRETATION.to_string(),
    chart: written,
    summary: format!(
      "{} people make up > {} of the commits in {}.",
      factor.num_people,
      percent(ctx.model.bus_factor_share),
      ctx.past_years()
    ),
    fragment: CsvFragment::BusFactor {
      num_people: factor.num_people,
      percents: join_shares(&factor),
    },
  })
}
