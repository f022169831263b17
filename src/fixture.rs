//! JSON-backed datastore for offline runs and CLI tests.
//!
//! Mirrors the Postgres adapter's filtering so the same metrics come out of either source.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{is_bot_login, BotDenylist};
use crate::contributors::{AliasResolver, AuthorCommits};
use crate::datastore::{Datastore, PullRequestActivity, RepoFlags, RepoRef, NO_PARENT};
use crate::error::HealthResult;
use crate::series::MonthlyCounts;
use crate::window::{AnalysisWindow, YearMonth};

fn no_parent() -> Option<String> {
  Some(NO_PARENT.to_string())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureRepo {
  pub id: i64,
  pub org: String,
  pub name: String,
  #[serde(default = "no_parent")]
  pub forked_from: Option<String>,
  #[serde(default)]
  pub archived: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureComment {
  pub login: String,
  pub at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixturePullRequest {
  pub repo_id: i64,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub merged_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub closed_at: Option<DateTime<Utc>>,
  /// `closed` or `open`; inferred from `closed_at` when absent.
  #[serde(default)]
  pub state: Option<String>,
  #[serde(default)]
  pub comments: Vec<FixtureComment>,
  #[serde(default)]
  pub reviews: Vec<DateTime<Utc>>,
}

impl FixturePullRequest {
  fn is_closed(&self) -> bool {
    match self.state.as_deref() {
      Some(state) => state == "closed",
      None => self.closed_at.is_some(),
    }
  }

  fn activity(&self) -> PullRequestActivity {
    PullRequestActivity {
      created_at: self.created_at,
      merged_at: self.merged_at,
      closed_at: self.closed_at,
      first_comment_at: self.comments.iter().filter(|c| !is_bot_login(&c.login)).map(|c| c.at).min(),
      first_review_at: self.reviews.iter().copied().min(),
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureCommit {
  pub repo_id: i64,
  pub hash: String,
  /// Git author name, matched against the denylist.
  pub author_name: String,
  pub login: String,
  #[serde(default)]
  pub email: Option<String>,
  pub authored_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureRelease {
  pub repo_id: i64,
  pub published_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FixtureDocument {
  #[serde(default)]
  pub identity_aliases: HashMap<String, String>,
  #[serde(default)]
  pub repos: Vec<FixtureRepo>,
  #[serde(default)]
  pub pull_requests: Vec<FixturePullRequest>,
  #[serde(default)]
  pub commits: Vec<FixtureCommit>,
  #[serde(default)]
  pub releases: Vec<FixtureRelease>,
}

pub struct FixtureStore {
  doc: FixtureDocument,
}

impl FixtureStore {
  pub fn new(doc: FixtureDocument) -> Self {
    Self { doc }
  }

  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let doc: FixtureDocument =
      serde_json::from_str(&raw).with_context(|| format!("parsing fixture {}", path.display()))?;

    tracing::info!(
      path = %path.display(),
      repos = doc.repos.len(),
      pull_requests = doc.pull_requests.len(),
      commits = doc.commits.len(),
      "loaded fixture datastore"
    );

    Ok(Self::new(doc))
  }

  fn repo_ref(r: &FixtureRepo) -> RepoRef {
    RepoRef {
      id: r.id,
      org: r.org.clone(),
      name: r.name.clone(),
    }
  }

  fn prs_in<'a>(&'a self, repo_id: i64, window: &'a AnalysisWindow) -> impl Iterator<Item = &'a FixturePullRequest> + 'a {
    self
      .doc
      .pull_requests
      .iter()
      .filter(move |pr| pr.repo_id == repo_id && window.contains(pr.created_at))
  }
}

impl Datastore for FixtureStore {
  fn resolve_repo(&self, org: &str, repo: &str) -> HealthResult<Option<RepoRef>> {
    let matches: Vec<&FixtureRepo> = self
      .doc
      .repos
      .iter()
      .filter(|r| r.org.eq_ignore_ascii_case(org) && r.name.eq_ignore_ascii_case(repo))
      .collect();

    Ok(match matches.as_slice() {
      [only] => Some(Self::repo_ref(only)),
      _ => None,
    })
  }

  fn org_repos(&self, org: &str) -> HealthResult<Vec<RepoRef>> {
    let mut repos: Vec<RepoRef> = self
      .doc
      .repos
      .iter()
      .filter(|r| r.org.eq_ignore_ascii_case(org))
      .map(Self::repo_ref)
      .collect();
    repos.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(repos)
  }

  fn repo_flags(&self, repo: &RepoRef) -> HealthResult<RepoFlags> {
    Ok(
      self
        .doc
        .repos
        .iter()
        .find(|r| r.id == repo.id)
        .map(|r| RepoFlags::from_columns(r.forked_from.as_deref(), r.archived))
        .unwrap_or_default(),
    )
  }

  fn monthly_pr_counts(&self, repo_id: i64, window: &AnalysisWindow) -> HealthResult<Vec<MonthlyCounts>> {
    let mut by_month: BTreeMap<YearMonth, (u64, u64)> = BTreeMap::new();

    for pr in self.prs_in(repo_id, window) {
      let slot = by_month.entry(YearMonth::of(pr.created_at)).or_default();
      slot.0 += 1;
      if pr.is_closed() {
        slot.1 += 1;
      }
    }

    Ok(
      by_month
        .into_iter()
        .map(|(ym, (total, closed))| MonthlyCounts::new(ym, total, closed))
        .collect(),
    )
  }

  fn author_commits(
    &self,
    repo_id: i64,
    window: &AnalysisWindow,
    denylist: &BotDenylist,
  ) -> HealthResult<Vec<AuthorCommits>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut by_login: BTreeMap<&str, AuthorCommits> = BTreeMap::new();

    for c in &self.doc.commits {
      if c.repo_id != repo_id || !window.contains(c.authored_at) || denylist.is_denied(&c.author_name) {
        continue;
      }
      if !seen.insert(c.hash.as_str()) {
        continue;
      }
      by_login
        .entry(c.login.as_str())
        .or_insert_with(|| AuthorCommits {
          login: c.login.clone(),
          email: c.email.clone(),
          commits: 0,
        })
        .commits += 1;
    }

    Ok(by_login.into_values().collect())
  }

  fn pr_activity(&self, repo_id: i64, window: &AnalysisWindow) -> HealthResult<Vec<PullRequestActivity>> {
    let mut out: Vec<PullRequestActivity> = self.prs_in(repo_id, window).map(FixturePullRequest::activity).collect();
    out.sort_by_key(|a| a.created_at);

    Ok(out)
  }

  fn release_dates(&self, repo_id: i64) -> HealthResult<Vec<DateTime<Utc>>> {
    let mut out: Vec<DateTime<Utc>> = self
      .doc
      .releases
      .iter()
      .filter(|r| r.repo_id == repo_id)
      .map(|r| r.published_at)
      .collect();
    out.sort();

    Ok(out)
  }

  fn identity_resolver(&self) -> AliasResolver {
    AliasResolver::new(&self.doc.identity_aliases)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{NaiveDate, TimeZone};

  fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
  }

  fn window() -> AnalysisWindow {
    AnalysisWindow::for_years(NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(), 1).unwrap()
  }

  fn doc() -> FixtureDocument {
    serde_json::from_value(serde_json::json!({
      "repos": [
        {"id": 1, "org": "acme", "name": "widgets", "archived": 0},
        {"id": 2, "org": "acme", "name": "gadgets", "forked_from": "upstream/gadgets", "archived": 1}
      ],
      "pull_requests": [
        {"repo_id": 1, "created_at": "2025-03-03T12:00:00Z", "closed_at": "2025-03-04T12:00:00Z",
         "comments": [{"login": "ci[bot]", "at": "2025-03-03T12:05:00Z"}, {"login": "ana", "at": "2025-03-03T15:00:00Z"}]},
        {"repo_id": 1, "created_at": "2025-03-10T12:00:00Z", "state": "open", "reviews": ["2025-03-20T00:00:00Z"]},
        {"repo_id": 1, "created_at": "2025-08-02T12:00:00Z", "closed_at": "2025-08-03T12:00:00Z"},
        {"repo_id": 2, "created_at": "2025-03-10T12:00:00Z"}
      ],
      "commits": [
        {"repo_id": 1, "hash": "a1", "author_name": "Ana", "login": "ana", "authored_at": "2025-01-10T00:00:00Z"},
        {"repo_id": 1, "hash": "a1", "author_name": "Ana", "login": "ana", "authored_at": "2025-01-10T00:00:00Z"},
        {"repo_id": 1, "hash": "a2", "author_name": "Ana", "login": "ana", "authored_at": "2025-02-10T00:00:00Z"},
        {"repo_id": 1, "hash": "b1", "author_name": "Bo", "login": "bo", "authored_at": "2025-02-11T00:00:00Z"},
        {"repo_id": 1, "hash": "d1", "author_name": "dependabot[bot]", "login": "dependabot", "authored_at": "2025-02-11T00:00:00Z"},
        {"repo_id": 1, "hash": "o1", "author_name": "Old", "login": "old", "authored_at": "2023-02-11T00:00:00Z"}
      ],
      "releases": [
        {"repo_id": 1, "published_at": "2025-06-01T00:00:00Z"},
        {"repo_id": 1, "published_at": "2024-01-01T00:00:00Z"}
      ]
    }))
    .unwrap()
  }

  #[test]
  fn resolves_case_insensitively() {
    let store = FixtureStore::new(doc());
    let r = store.resolve_repo("ACME", "Widgets").unwrap().unwrap();
    assert_eq!(r.id, 1);
    assert!(store.resolve_repo("acme", "missing").unwrap().is_none());
    let names: Vec<String> = store.org_repos("acme").unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["gadgets", "widgets"]);
    // org listing matches the same way single-repo lookup does
    let shouted: Vec<String> = store.org_repos("ACME").unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(shouted, names);
  }

  #[test]
  fn flags_follow_columns() {
    let store = FixtureStore::new(doc());
    let widgets = store.resolve_repo("acme", "widgets").unwrap().unwrap();
    let gadgets = store.resolve_repo("acme", "gadgets").unwrap().unwrap();
    assert_eq!(store.repo_flags(&widgets).unwrap(), RepoFlags { is_fork: false, is_archived: Some(false) });
    assert_eq!(store.repo_flags(&gadgets).unwrap(), RepoFlags { is_fork: true, is_archived: Some(true) });
  }

  #[test]
  fn pr_counts_respect_window_and_state() {
    let store = FixtureStore::new(doc());
    let counts = store.monthly_pr_counts(1, &window()).unwrap();
    // the August PR falls in the partial as-of month
    assert_eq!(counts, vec![MonthlyCounts::new(YearMonth::new(2025, 3).unwrap(), 2, 1)]);
  }

  #[test]
  fn commits_are_distinct_and_bot_filtered() {
    let store = FixtureStore::new(doc());
    let rows = store.author_commits(1, &window(), &BotDenylist::default()).unwrap();
    let pairs: Vec<(&str, u64)> = rows.iter().map(|r| (r.login.as_str(), r.commits)).collect();
    assert_eq!(pairs, vec![("ana", 2), ("bo", 1)]);
  }

  #[test]
  fn activity_skips_bot_comments() {
    let store = FixtureStore::new(doc());
    let prs = store.pr_activity(1, &window()).unwrap();
    assert_eq!(prs.len(), 2);
    assert_eq!(prs[0].first_comment_at, Some(Utc.with_ymd_and_hms(2025, 3, 3, 15, 0, 0).unwrap()));
    assert_eq!(prs[0].first_response(), Some(Utc.with_ymd_and_hms(2025, 3, 3, 15, 0, 0).unwrap()));
    assert_eq!(prs[1].first_review_at, Some(Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()));
  }

  #[test]
  fn releases_are_sorted() {
    let store = FixtureStore::new(doc());
    assert_eq!(store.release_dates(1).unwrap(), vec![ts(2024, 1, 1), ts(2025, 6, 1)]);
    assert!(store.release_dates(9).unwrap().is_empty());
  }
}
