// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Quarter-over-quarter trend verdict and trailing-month breach counter for monthly gap series
// role: aggregation/trend
// inputs: Ordered Vec<MonthlyRecord>; TrendWindows; breach threshold
// outputs: TrendAssessment (verdict, both window sums and labels, magnitude); breach counts
// invariants:
// - Windows are selected by counting back from the last row, never by fixed index
// - previous + recent == 0 ⇒ Neutral with no magnitude
// - magnitude <= neutral band ⇒ Neutral; swapping the sums flips Positive/Negative
// errors: InvalidWindow when the series is shorter than size + lag
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;

use crate::error::{HealthError, HealthResult};
use crate::series::MonthlyRecord;

/// Relative change at or below which two windows are considered similar.
pub const NEUTRAL_MAGNITUDE: f64 = 0.10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrendVerdict {
  Positive,
  Neutral,
  Negative,
}

impl fmt::Display for TrendVerdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Positive => "Positive",
      Self::Neutral => "Neutral",
      Self::Negative => "Negative",
    };
    f.write_str(s)
  }
}

/// Which trailing windows to compare.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrendWindows {
  /// Months per window.
  pub size: usize,
  /// Offset, in months, between the recent window and the previous one.
  pub lag: usize,
}

impl Default for TrendWindows {
  fn default() -> Self {
    Self { size: 3, lag: 3 }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowSum {
  /// e.g. `2025-07 - 2025-09`
  pub label: String,
  pub sum: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrendAssessment {
  pub verdict: TrendVerdict,
  pub recent: WindowSum,
  pub previous: WindowSum,
  /// `|previous - recent| / (previous + recent)`; `None` when both sums are zero.
  pub magnitude: Option<f64>,
}

impl TrendAssessment {
  /// The sentence appended to chart titles.
  pub fn sentence(&self) -> String {
    let relation = match self.verdict {
      TrendVerdict::Neutral => "is similar to",
      TrendVerdict::Positive => "is smaller than",
      TrendVerdict::Negative => "is larger than",
    };
    format!(
      "Trend: {} - the {} gap {} the {} gap.",
      self.verdict, self.recent.label, relation, self.previous.label
    )
  }
}

/// Classify two window sums.
pub fn classify_sums(recent: u64, previous: u64) -> (TrendVerdict, Option<f64>) {
  let total = previous + recent;

  if total == 0 {
    return (TrendVerdict::Neutral, None);
  }

  let magnitude = previous.abs_diff(recent) as f64 / total as f64;

  let verdict = if magnitude <= NEUTRAL_MAGNITUDE || recent == previous {
    TrendVerdict::Neutral
  } else if recent < previous {
    TrendVerdict::Positive
  } else {
    TrendVerdict::Negative
  };

  (verdict, Some(magnitude))
}

fn window_sum(rows: &[MonthlyRecord]) -> WindowSum {
  let label = match (rows.first(), rows.last()) {
    (Some(first), Some(last)) => format!("{} - {}", first.year_month, last.year_month),
    _ => String::new(),
  };

  WindowSum {
    label,
    sum: rows.iter().map(|r| r.gap).sum(),
  }
}

/// Compare the trailing window of `series` against the window `lag` months before it.
pub fn assess_trend(series: &[MonthlyRecord], windows: TrendWindows) -> HealthResult<TrendAssessment> {
  if windows.size == 0 || windows.lag == 0 {
    return Err(HealthError::InvalidWindow("trend windows must be non-empty".into()));
  }

  let needed = windows.size + windows.lag;

  if series.len() < needed {
    return Err(HealthError::InvalidWindow(format!(
      "trend comparison needs {needed} months, series has {}",
      series.len()
    )));
  }

  let recent_end = series.len();
  let recent_start = recent_end - windows.size;
  let previous_end = recent_end - windows.lag;
  let previous_start = previous_end - windows.size;

  let recent = window_sum(&series[recent_start..recent_end]);
  let previous = window_sum(&series[previous_start..previous_end]);
  let (verdict, magnitude) = classify_sums(recent.sum, previous.sum);

  Ok(TrendAssessment {
    verdict,
    recent,
    previous,
    magnitude,
  })
}

/// Count the trailing `months` rows whose defined gap percent exceeds `threshold`.
pub fn count_breaches(series: &[MonthlyRecord], months: usize, threshold: f64) -> usize {
  let start = series.len().saturating_sub(months);

  series[start..]
    .iter()
    .filter(|r| r.gap_percent.is_some_and(|p| p > threshold))
    .count()
}
