// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Build gap-free monthly series from raw events or pre-aggregated counts and derive per-month gaps
// role: aggregation/monthly-series
// inputs: AnalysisWindow; MonthlyCounts rows or (timestamp, Outcome) events
// outputs: Vec<MonthlyRecord> with one row per calendar month in [start, end)
// invariants:
// - Output length == window.month_count(); year_month strictly increasing; no duplicates
// - Zero-filled months have total_count == 0 and gap_percent == None
// - gap_percent is within [0, 1] whenever defined; None when its denominator is 0
// - Building from a series' own output is idempotent
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::window::{AnalysisWindow, YearMonth};

/// How one event counts toward its month.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
  /// Closed, or answered within guidelines.
  Matched,
  Unmatched,
  /// Counts toward volume but not toward the gap ratio (e.g. a PR nobody responded to).
  Undetermined,
}

/// Pre-aggregated counts for one month, as delivered by a datastore.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MonthlyCounts {
  pub year_month: YearMonth,
  pub total: u64,
  pub matched: u64,
  pub excluded: u64,
}

impl MonthlyCounts {
  pub fn new(year_month: YearMonth, total: u64, matched: u64) -> Self {
    Self {
      year_month,
      total,
      matched,
      excluded: 0,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyRecord {
  #[serde(serialize_with = "serialize_year_month")]
  pub year_month: YearMonth,
  pub total_count: u64,
  pub matched_count: u64,
  pub excluded_count: u64,
  pub gap: u64,
  pub gap_percent: Option<f64>,
}

fn serialize_year_month<S: serde::Serializer>(ym: &YearMonth, s: S) -> Result<S::Ok, S::Error> {
  s.collect_str(ym)
}

impl MonthlyRecord {
  pub fn new(year_month: YearMonth, total: u64, matched: u64, excluded: u64) -> Self {
    let excluded = excluded.min(total);
    let matched = matched.min(total - excluded);
    let (gap, gap_percent) = gap_ratio(total, matched, excluded);

    Self {
      year_month,
      total_count: total,
      matched_count: matched,
      excluded_count: excluded,
      gap,
      gap_percent,
    }
  }

  pub fn empty(year_month: YearMonth) -> Self {
    Self::new(year_month, 0, 0, 0)
  }
}

impl From<&MonthlyRecord> for MonthlyCounts {
  fn from(r: &MonthlyRecord) -> Self {
    Self {
      year_month: r.year_month,
      total: r.total_count,
      matched: r.matched_count,
      excluded: r.excluded_count,
    }
  }
}

/// Derive `(gap, gap_percent)` for a single month.
///
/// `gap = total - matched - excluded`; the percent is taken over the months' determinable
/// volume (`total - excluded`) and left undefined when that is zero.
pub fn gap_ratio(total: u64, matched: u64, excluded: u64) -> (u64, Option<f64>) {
  let considered = total.saturating_sub(excluded);
  let gap = considered.saturating_sub(matched);

  if considered == 0 {
    return (gap, None);
  }
  (gap, Some(gap as f64 / considered as f64))
}

/// Build one record per month in the window from pre-aggregated counts.
///
/// Months outside the window are dropped, repeated months are summed, and months with no
/// counts are synthesized as zero rows.
pub fn build_monthly_series<I>(window: &AnalysisWindow, counts: I) -> Vec<MonthlyRecord>
where
  I: IntoIterator<Item = MonthlyCounts>,
{
  let mut by_month: BTreeMap<YearMonth, (u64, u64, u64)> = BTreeMap::new();

  for c in counts {
    if !window.contains_month(c.year_month) {
      tracing::debug!(month = %c.year_month, "dropping counts outside analysis window");
      continue;
    }
    let slot = by_month.entry(c.year_month).or_default();
    slot.0 += c.total;
    slot.1 += c.matched;
    slot.2 += c.excluded;
  }

  window
    .months()
    .map(|ym| match by_month.get(&ym) {
      Some(&(total, matched, excluded)) => MonthlyRecord::new(ym, total, matched, excluded),
      None => MonthlyRecord::empty(ym),
    })
    .collect()
}

/// Bucket raw `(timestamp, outcome)` events by calendar month, then build the series.
pub fn bucket_events<I>(window: &AnalysisWindow, events: I) -> Vec<MonthlyRecord>
where
  I: IntoIterator<Item = (DateTime<Utc>, Outcome)>,
{
  let counts = events.into_iter().filter(|(ts, _)| window.contains(*ts)).map(|(ts, outcome)| {
    let ym = YearMonth::of(ts);
    match outcome {
      Outcome::Matched => MonthlyCounts {
        year_month: ym,
        total: 1,
        matched: 1,
        excluded: 0,
      },
      Outcome::Unmatched => MonthlyCounts::new(ym, 1, 0),
      Outcome::Undetermined => MonthlyCounts {
        year_month: ym,
        total: 1,
        matched: 0,
        excluded: 1,
      },
    }
  });

  build_monthly_series(window, counts)
}

pub fn total_volume(series: &[MonthlyRecord]) -> u64 {
  series.iter().map(|r| r.total_count).sum()
}
