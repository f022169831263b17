//! Where charts and summaries land.
//!
//! Everything is keyed by the report month of the analysis window, never by the wall clock,
//! so a fixed `--as-of` date always yields the same tree.

use std::path::{Path, PathBuf};

use crate::datastore::RepoRef;
use crate::window::YearMonth;

/// One chart per metric; the slug becomes part of the file name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChartKind {
  ActivityRelease,
  SustainsPr,
  BusFactor { years: u32 },
  FirstResponsePr,
}

impl ChartKind {
  pub fn slug(&self) -> String {
    match self {
      ChartKind::ActivityRelease => "activity_release".to_string(),
      ChartKind::SustainsPr => "sustains_pr".to_string(),
      ChartKind::BusFactor { years } => format!("bus_factor_y{years}"),
      ChartKind::FirstResponsePr => "first_response_pr".to_string(),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLocation {
  root: PathBuf,
  report_month: YearMonth,
  org: String,
}

impl ArtifactLocation {
  pub fn new(root: impl Into<PathBuf>, report_month: YearMonth, org: &str) -> Self {
    Self {
      root: root.into(),
      report_month,
      org: org.to_string(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn report_month(&self) -> YearMonth {
    self.report_month
  }

  fn month_dir(&self) -> PathBuf {
    self.root.join(self.report_month.to_string())
  }

  /// `root/YYYY-MM/org/repo`, using the repository's canonical names.
  pub fn dir(&self, repo: &RepoRef) -> PathBuf {
    self.month_dir().join(&repo.org).join(&repo.name)
  }

  /// Like [`dir`](Self::dir), creating it if needed.
  pub fn ensure_dir(&self, repo: &RepoRef) -> std::io::Result<PathBuf> {
    let dir = self.dir(repo);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
  }

  pub fn chart_path(&self, repo: &RepoRef, kind: ChartKind) -> PathBuf {
    self.dir(repo).join(format!("{}_{}.png", repo.name, kind.slug()))
  }

  pub fn summary_path(&self) -> PathBuf {
    self
      .month_dir()
      .join(&self.org)
      .join(format!("{}_health_summary.csv", self.org))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn loc(root: &Path) -> ArtifactLocation {
    ArtifactLocation::new(root, YearMonth::new(2025, 9).unwrap(), "acme")
  }

  fn repo() -> RepoRef {
    RepoRef {
      id: 7,
      org: "acme".into(),
      name: "widgets".into(),
    }
  }

  #[test]
  fn chart_paths_follow_month_org_repo_layout() {
    let l = loc(Path::new("out"));
    assert_eq!(
      l.chart_path(&repo(), ChartKind::SustainsPr),
      Path::new("out/2025-09/acme/widgets/widgets_sustains_pr.png")
    );
    assert_eq!(
      l.chart_path(&repo(), ChartKind::BusFactor { years: 2 }),
      Path::new("out/2025-09/acme/widgets/widgets_bus_factor_y2.png")
    );
    assert_eq!(ChartKind::ActivityRelease.slug(), "activity_release");
    assert_eq!(ChartKind::FirstResponsePr.slug(), "first_response_pr");
  }

  #[test]
  fn renamed_repo_uses_its_own_org() {
    let l = loc(Path::new("out"));
    let renamed = RepoRef {
      id: 7,
      org: "acme-labs".into(),
      name: "widgets-core".into(),
    };
    assert_eq!(l.dir(&renamed), Path::new("out/2025-09/acme-labs/widgets-core"));
  }

  #[test]
  fn summary_sits_in_org_dir() {
    assert_eq!(
      loc(Path::new("out")).summary_path(),
      Path::new("out/2025-09/acme/acme_health_summary.csv")
    );
  }

  #[test]
  fn ensure_dir_creates_on_demand() {
    let td = tempfile::TempDir::new().unwrap();
    let l = loc(td.path());
    assert!(!l.dir(&repo()).exists());
    let made = l.ensure_dir(&repo()).unwrap();
    assert!(made.is_dir());
    // idempotent
    l.ensure_dir(&repo()).unwrap();
  }
}
