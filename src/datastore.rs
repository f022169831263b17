// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Read-only collaborator seam over mined repository activity (repos, PRs, commits, releases)
// role: datastore/interface
// inputs: org/repo identifiers; AnalysisWindow; BotDenylist
// outputs: RepoRef, RepoFlags, MonthlyCounts, AuthorCommits, PullRequestActivity, release timestamps
// invariants:
// - Windowed queries are half-open [start, end) on the PR creation / commit author timestamp
// - first_response is the earliest of merge, close, first human comment and first review
// - A PR with no response in any source classifies as Outcome::Undetermined
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::BotDenylist;
use crate::contributors::{AliasResolver, AuthorCommits};
use crate::error::HealthResult;
use crate::series::{MonthlyCounts, Outcome};
use crate::window::{add_business_days, AnalysisWindow};

/// Marker the datastore stores in `forked_from` for non-forks.
pub const NO_PARENT: &str = "Parent not available";

/// A repository resolved to its datastore key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
  pub id: i64,
  pub org: String,
  pub name: String,
}

impl RepoRef {
  pub fn full_name(&self) -> String {
    format!("{}/{}", self.org, self.name)
  }

  pub fn git_url(&self) -> String {
    format!("https://github.com/{}/{}", self.org, self.name)
  }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RepoFlags {
  pub is_fork: bool,
  /// `None` when the datastore holds neither 1 nor 0.
  pub is_archived: Option<bool>,
}

impl RepoFlags {
  pub fn from_columns(forked_from: Option<&str>, archived: Option<i64>) -> Self {
    Self {
      is_fork: forked_from.map(|f| f != NO_PARENT).unwrap_or(false),
      is_archived: match archived {
        Some(1) => Some(true),
        Some(0) => Some(false),
        _ => None,
      },
    }
  }
}

/// The per-PR timestamps that can count as a first response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestActivity {
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub merged_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub closed_at: Option<DateTime<Utc>>,
  /// Earliest comment by a non-bot account.
  #[serde(default)]
  pub first_comment_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub first_review_at: Option<DateTime<Utc>>,
}

impl PullRequestActivity {
  pub fn first_response(&self) -> Option<DateTime<Utc>> {
    [self.merged_at, self.closed_at, self.first_comment_at, self.first_review_at]
      .into_iter()
      .flatten()
      .min()
  }

  /// Whether the first response landed within `business_days` of creation.
  pub fn response_outcome(&self, business_days: u32) -> Outcome {
    match self.first_response() {
      None => Outcome::Undetermined,
      Some(at) if at <= add_business_days(self.created_at, business_days) => Outcome::Matched,
      Some(_) => Outcome::Unmatched,
    }
  }
}

/// Everything the metric facades read from mined repository activity.
pub trait Datastore {
  /// Case-insensitive lookup; anything other than exactly one match yields `None`.
  fn resolve_repo(&self, org: &str, repo: &str) -> HealthResult<Option<RepoRef>>;

  /// Every repository in the org (case-insensitive), ordered by name.
  fn org_repos(&self, org: &str) -> HealthResult<Vec<RepoRef>>;

  fn repo_flags(&self, repo: &RepoRef) -> HealthResult<RepoFlags>;

  /// PRs created per month, and how many of those are now closed.
  fn monthly_pr_counts(&self, repo_id: i64, window: &AnalysisWindow) -> HealthResult<Vec<MonthlyCounts>>;

  /// Distinct commits per author login, excluding denylisted author names.
  fn author_commits(
    &self,
    repo_id: i64,
    window: &AnalysisWindow,
    denylist: &BotDenylist,
  ) -> HealthResult<Vec<AuthorCommits>>;

  fn pr_activity(&self, repo_id: i64, window: &AnalysisWindow) -> HealthResult<Vec<PullRequestActivity>>;

  fn release_dates(&self, repo_id: i64) -> HealthResult<Vec<DateTime<Utc>>>;

  /// Identity merge strategy configured alongside this datastore.
  fn identity_resolver(&self) -> AliasResolver {
    AliasResolver::default()
  }
}
