//! Closure ratio: are PRs opened each month getting closed?

use crate::artifacts::ChartKind;
use crate::chart::{Line, LineChart, LineEmphasis};
use crate::config::HealthModel;
use crate::datastore::Datastore;
use crate::error::{HealthError, HealthResult};
use crate::series::{build_monthly_series, total_volume, MonthlyCounts, MonthlyRecord};
use crate::trend::{assess_trend, count_breaches, TrendAssessment};
use crate::window::AnalysisWindow;

use super::{month_labels, percent, CsvFragment, MetricContext, MetricReport, GAP_INTERPRETATION};

#[derive(Clone, Debug, PartialEq)]
pub struct ClosureAnalysis {
  pub series: Vec<MonthlyRecord>,
  pub trend: TrendAssessment,
  pub breach_months: usize,
}

pub fn analyze(window: &AnalysisWindow, counts: Vec<MonthlyCounts>, model: &HealthModel) -> HealthResult<ClosureAnalysis> {
  let series = build_monthly_series(window, counts);
  let volume = total_volume(&series);

  if volume < model.min_prs {
    tracing::info!(volume, min = model.min_prs, "closure ratio gate not met");
    return Err(HealthError::too_few_prs());
  }

  let trend = assess_trend(&series, model.trend)?;
  let breach_months = count_breaches(&series, model.breach_months, model.closure_gap_threshold);

  Ok(ClosureAnalysis {
    series,
    trend,
    breach_months,
  })
}

pub fn run(ctx: &MetricContext<'_>, store: &dyn Datastore) -> HealthResult<MetricReport> {
  let counts = store.monthly_pr_counts(ctx.repo.id, ctx.window)?;
  let analysis = analyze(ctx.window, counts, ctx.model)?;

  let title = format!(
    "{}\nSustains and Keeps up with Contributions\n{}",
    ctx.heading(),
    analysis.trend.sentence()
  );

  let chart = LineChart {
    title: title.clone(),
    caption: format!("Year Month\n\n{GAP_INTERPRETATION}"),
    x_labels: month_labels(&analysis.series),
    y_label: "Number of PRs".into(),
    lines: vec![
      Line {
        label: "Total".into(),
        values: analysis.series.iter().map(|r| r.total_count).collect(),
        emphasis: LineEmphasis::Total,
      },
      Line {
        label: "Closed".into(),
        values: analysis.series.iter().map(|r| r.matched_count).collect(),
        emphasis: LineEmphasis::Matched,
      },
    ],
  };
  let path = ctx.artifacts.chart_path(ctx.repo, ChartKind::SustainsPr);
  let written = ctx.renderer.line_chart(&chart, &path)?;

  Ok(MetricReport {
    title,
    interpretation: GAP_INTERPRETATION.to_string(),
    chart: written,
    summary: format!(
      "Number of months in the past {} months with > {} of PRs not closed: {}",
      ctx.model.breach_months,
      percent(ctx.model.closure_gap_threshold),
      analysis.breach_months
    ),
    fragment: CsvFragment::ClosureBreaches(analysis.breach_months),
  })
}
