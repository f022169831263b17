use chrono::{DateTime, Duration, Utc};

use crate::artifacts::ChartKind;
use crate::chart::ReleaseChart;
use crate::error::{HealthError, HealthResult};
use crate::github::ReleaseSource;
use crate::window::AnalysisWindow;

use super::{CsvFragment, MetricContext, MetricReport};

pub const INTERPRETATION: &str =
  "Interpretation: Healthy projects will have frequent releases with security updates, bug fixes, and features.";

/// Releases published in `[end - lookback_days, end]`, both ends inclusive.
pub fn count_recent(releases: &[DateTime<Utc>], window: &AnalysisWindow, lookback_days: i64) -> usize {
  let end = window.end_ts();
  let from = end - Duration::days(lookback_days);

  releases.iter().filter(|r| **r >= from && **r <= end).count()
}

pub fn run(ctx: &MetricContext<'_>, source: &dyn ReleaseSource) -> HealthResult<MetricReport> {
  let releases = match source.releases(ctx.repo) {
    Ok(r) => r,
    Err(e) if e.is_fatal() => return Err(e),
    Err(e) => {
      // missing release data is a skipped metric, not a failed run
      tracing::warn!(repo = %ctx.repo.full_name(), error = %e, "release data unavailable");
      return Err(HealthError::no_data());
    }
  };

  let recent = count_recent(&releases, ctx.window, ctx.model.release_lookback_days);
  if recent == 0 {
    return Err(HealthError::no_data());
  }

  let title = format!("{}\n{} releases in the past 6 months.", ctx.heading(), recent);

  let chart = ReleaseChart {
    title: title.clone(),
    caption: format!("Year Month\n\n{INTERPRETATION}"),
    start: ctx.window.start(),
    end: ctx.window.end(),
    releases,
  };
  let path = ctx.artifacts.chart_path(ctx.repo, ChartKind::ActivityRelease);
  let written = ctx.renderer.release_chart(&chart, &path)?;

  Ok(MetricReport {
    title,
    interpretation: INTERPRETATION.to_string(),
    chart: written,
    summary: format!("{recent} releases in the past 6 months"),
    fragment: CsvFragment::ReleaseCount(recent),
  })
}
