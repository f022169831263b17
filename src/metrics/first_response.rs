//! First response: how many PRs hear back within the business-day guideline.

use crate::artifacts::ChartKind;
use crate::chart::{Line, LineChart, LineEmphasis};
use crate::config::HealthModel;
use crate::datastore::{Datastore, PullRequestActivity};
use crate::error::{HealthError, HealthResult};
use crate::series::{bucket_events, total_volume, MonthlyRecord};
use crate::trend::{assess_trend, count_breaches, TrendAssessment};
use crate::window::AnalysisWindow;

use super::{month_labels, percent, CsvFragment, MetricContext, MetricReport, GAP_INTERPRETATION};

#[derive(Clone, Debug, PartialEq)]
pub struct ResponseAnalysis {
  pub series: Vec<MonthlyRecord>,
  pub trend: TrendAssessment,
  pub breach_months: usize,
}

pub fn analyze(window: &AnalysisWindow, prs: &[PullRequestActivity], model: &HealthModel) -> HealthResult<ResponseAnalysis> {
  let in_window: Vec<&PullRequestActivity> = prs.iter().filter(|pr| window.contains(pr.created_at)).collect();

  if (in_window.len() as u64) < model.min_prs {
    tracing::info!(volume = in_window.len(), min = model.min_prs, "first response gate not met");
    return Err(HealthError::too_few_prs());
  }
  if in_window.iter().all(|pr| pr.first_response().is_none()) {
    return Err(HealthError::comments_missing());
  }

  let series = bucket_events(
    window,
    in_window
      .iter()
      .map(|pr| (pr.created_at, pr.response_outcome(model.business_days))),
  );
  debug_assert_eq!(total_volume(&series), in_window.len() as u64);

  let trend = assess_trend(&series, model.trend)?;
  let breach_months = count_breaches(&series, model.breach_months, model.response_gap_threshold);

  Ok(ResponseAnalysis {
    series,
    trend,
    breach_months,
  })
}

pub fn run(ctx: &MetricContext<'_>, store: &dyn Datastore) -> HealthResult<MetricReport> {
  let prs = store.pr_activity(ctx.repo.id, ctx.window)?;
  let analysis = analyze(ctx.window, &prs, ctx.model)?;
  let days = ctx.model.business_days;

  let title = format!("{}\nTimely Responses\n{}", ctx.heading(), analysis.trend.sentence());

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
        label: format!("Response < {days} bus days"),
        values: analysis.series.iter().map(|r| r.matched_count).collect(),
        emphasis: LineEmphasis::Matched,
      },
    ],
  };
  let path = ctx.artifacts.chart_path(ctx.repo, ChartKind::FirstResponsePr);
  let written = ctx.renderer.line_chart(&chart, &path)?;

  Ok(MetricReport {
    title,
    interpretation: GAP_INTERPRETATION.to_string(),
    chart: written,
    summary: format!(
      "{} months with more than {} of pull requests not responded to within {} business days in the past {} months",
      analysis.breach_months,
      percent(ctx.model.response_gap_threshold),
      days,
      ctx.model.breach_months
    ),
    fragment: CsvFragment::ResponseBreaches(analysis.breach_months),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{PR_COMMENTS_MISSING, TOO_FEW_PRS};
  use crate::metrics::testing::Harness;
  use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

  /// A Wednesday morning in `month` of the analysis year.
  fn created(month: u32) -> DateTime<Utc> {
    let (year, m) = if month >= 10 { (2024, month) } else { (2025, month) };
    let first = Utc.with_ymd_and_hms(year, m, 1, 9, 0, 0).unwrap();
    let offset = (3 + 7 - first.weekday().num_days_from_sunday()) % 7;
    first + Duration::days(offset as i64)
  }

  fn pr(created_at: DateTime<Utc>, first_comment_after_hours: Option<i64>) -> PullRequestActivity {
    PullRequestActivity {
      created_at,
      merged_at: None,
      closed_at: None,
      first_comment_at: first_comment_after_hours.map(|h| created_at + Duration::hours(h)),
      first_review_at: None,
    }
  }

  fn year_of_prs(slow_months: &[u32]) -> Vec<PullRequestActivity> {
    (1..=12)
      .flat_map(|m| {
        let slow = slow_months.contains(&m);
        (0..3).map(move |i| pr(created(m), Some(if slow && i == 0 { 24 * 6 } else { 4 })))
      })
      .collect()
  }

  #[test]
  fn fewer_than_minimum_is_too_few() {
    let h = Harness::new();
    let prs: Vec<_> = (1..=9).map(|m| pr(created(m), Some(1))).collect();
    let err = analyze(&h.window, &prs, &h.model).unwrap_err();
    assert!(matches!(err, HealthError::InsufficientData { reason } if reason == TOO_FEW_PRS));
  }

  #[test]
  fn no_responses_anywhere_is_missing_signal() {
    let h = Harness::new();
    let prs: Vec<_> = (1..=12).flat_map(|m| (0..2).map(move |_| pr(created(m), None))).collect();
    let err = analyze(&h.window, &prs, &h.model).unwrap_err();
    assert!(matches!(err, HealthError::MissingSignal { reason } if reason == PR_COMMENTS_MISSING));
  }

  #[test]
  fn slow_months_breach_and_trend_negative() {
    let h = Harness::new();
    let a = analyze(&h.window, &year_of_prs(&[7, 8, 9]), &h.model).unwrap();

    assert_eq!(a.series.len(), 12);
    assert_eq!(a.breach_months, 3);
    assert_eq!(a.trend.verdict, crate::trend::TrendVerdict::Negative);
  }

  #[test]
  fn unanswered_prs_count_as_volume_only() {
    let h = Harness::new();
    let mut prs = year_of_prs(&[]);
    // every September PR but one goes unanswered
    for p in prs.iter_mut().filter(|p| p.created_at.month() == 9).skip(1) {
      p.first_comment_at = None;
    }
    let a = analyze(&h.window, &prs, &h.model).unwrap();
    let sept = a.series.last().unwrap();

    assert_eq!(sept.total_count, 3);
    assert_eq!(sept.excluded_count, 2);
    assert_eq!(sept.gap, 0);
    assert_eq!(sept.gap_percent, Some(0.0));
    assert_eq!(a.breach_months, 0);
  }

  #[test]
  fn report_uses_business_day_labels() {
    let mut h = Harness::new();
    h.model.business_days = 3;

    let doc: crate::fixture::FixtureDocument = serde_json::from_value(serde_json::json!({
      "repos": [{"id": 1, "org": "acme", "name": "widgets"}],
      "pull_requests": year_of_prs(&[9]).iter().map(|p| serde_json::json!({
        "repo_id": 1,
        "created_at": p.created_at,
        "comments": [{"login": "maintainer", "at": p.first_comment_at}]
      })).collect::<Vec<_>>()
    }))
    .unwrap();
    let store = crate::fixture::FixtureStore::new(doc);

    let report = run(&h.ctx(), &store).unwrap();
    assert!(report.title.starts_with("acme/widgets\nTimely Responses\nTrend: "));
    assert_eq!(
      report.summary,
      "1 months with more than 15% of pull requests not responded to within 3 business days in the past 6 months"
    );
    assert_eq!(h.renderer.lines.borrow()[0].lines[1].label, "Response < 3 bus days");
  }
}
