// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: The four metric facades and the context/report types they share
// role: metrics/facades
// inputs: MetricContext (canonical repo, window, model, artifact location, renderer) + a data collaborator
// outputs: MetricReport (title, caption, chart path, operator summary, CSV fragment)
// invariants:
// - A failed gate returns before any chart is requested
// - Titles and artifact paths use the canonical repository name
// errors: InsufficientData / MissingSignal for gates; collaborator errors propagate unchanged
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use crate::artifacts::ArtifactLocation;
use crate::chart::ChartRenderer;
use crate::config::HealthModel;
use crate::datastore::RepoRef;
use crate::report::SummaryRow;
use crate::series::MonthlyRecord;
use crate::window::AnalysisWindow;

pub mod bus_factor;
pub mod closure_ratio;
pub mod first_response;
pub mod release_frequency;

pub const GAP_INTERPRETATION: &str =
  "Interpretation: Healthy projects will have little or no gap. A large or increasing gap requires attention.";

/// Everything a facade needs besides its data collaborator.
pub struct MetricContext<'a> {
  /// Canonical names; `id` is the datastore key.
  pub repo: &'a RepoRef,
  pub window: &'a AnalysisWindow,
  pub model: &'a HealthModel,
  pub years: u32,
  pub artifacts: &'a ArtifactLocation,
  pub renderer: &'a dyn ChartRenderer,
}

impl MetricContext<'_> {
  fn heading(&self) -> String {
    self.repo.full_name()
  }

  fn past_years(&self) -> String {
    match self.years {
      1 => "the past year".to_string(),
      n => format!("the past {n} years"),
    }
  }
}

/// The slice of a summary row a metric is responsible for.
#[derive(Clone, Debug, PartialEq)]
pub enum CsvFragment {
  ReleaseCount(usize),
  ClosureBreaches(usize),
  BusFactor { num_people: usize, percents: String },
  ResponseBreaches(usize),
}

impl CsvFragment {
  pub fn apply(&self, row: &mut SummaryRow) {
    match self {
      CsvFragment::ReleaseCount(n) => row.release_count = Some(*n),
      CsvFragment::ClosureBreaches(n) => row.closure_breach_months = Some(*n),
      CsvFragment::BusFactor { num_people, percents } => {
        row.bus_factor_n = Some(*num_people);
        row.bus_factor_percents = Some(percents.clone());
      }
      CsvFragment::ResponseBreaches(n) => row.first_response_breach_months = Some(*n),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricReport {
  pub title: String,
  pub interpretation: String,
  /// `None` when charts are disabled.
  pub chart: Option<PathBuf>,
  /// The line printed for the operator.
  pub summary: String,
  pub fragment: CsvFragment,
}

fn month_labels(series: &[MonthlyRecord]) -> Vec<String> {
  series.iter().map(|r| r.year_month.to_string()).collect()
}

/// `0.15` renders as `15%`.
fn percent(threshold: f64) -> String {
  format!("{:.0}%", threshold * 100.0)
}
