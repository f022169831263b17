// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Domain error taxonomy shared by the aggregation core, collaborators and metric facades
// role: errors/taxonomy
// outputs: HealthError enum and HealthResult alias
// invariants:
// - InsufficientData / MissingSignal / InvalidWindow skip a single metric, never the run
// - RateLimited is the only variant that aborts the whole run
// - Display strings for skip reasons match the operator-facing markers ("TOO FEW PRs", "NO DATA", ...)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

pub type HealthResult<T> = Result<T, HealthError>;

pub const TOO_FEW_PRS: &str = "TOO FEW PRs";
pub const NO_DATA: &str = "NO DATA";
pub const PR_COMMENTS_MISSING: &str = "PR COMMENTS MISSING";

#[derive(Debug, Error)]
pub enum HealthError {
  /// A sample-size gate was not met.
  #[error("{reason}")]
  InsufficientData { reason: &'static str },

  /// The gate passed but the signal needed for the metric is absent.
  #[error("{reason}")]
  MissingSignal { reason: &'static str },

  #[error("invalid analysis window: {0}")]
  InvalidWindow(String),

  #[error("datastore error: {0}")]
  Datastore(String),

  #[error("GitHub API rate limit nearly exhausted ({remaining} requests remaining)")]
  RateLimited { remaining: u32 },

  #[error("GitHub API error: {0}")]
  Api(String),

  #[error("chart rendering failed: {0}")]
  Render(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl HealthError {
  pub fn too_few_prs() -> Self {
    Self::InsufficientData { reason: TOO_FEW_PRS }
  }

  pub fn no_data() -> Self {
    Self::InsufficientData { reason: NO_DATA }
  }

  pub fn comments_missing() -> Self {
    Self::MissingSignal {
      reason: PR_COMMENTS_MISSING,
    }
  }

  pub fn datastore(message: impl Into<String>) -> Self {
    Self::Datastore(message.into())
  }

  /// Whether the run must stop instead of skipping to the next metric or repository.
  pub fn is_fatal(&self) -> bool {
    matches!(self, Self::RateLimited { .. })
  }
}

impl From<sqlx::Error> for HealthError {
  fn from(e: sqlx::Error) -> Self {
    Self::Datastore(e.to_string())
  }
}
