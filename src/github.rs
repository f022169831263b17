// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Release-data collaborator (GitHub REST or the datastore's releases table) and token discovery
// role: collaborators/github
// inputs: --gh-key file; env GITHUB_TOKEN / GH_TOKEN; optional `gh` CLI; RepoRef
// outputs: Canonical (possibly renamed) repo names and release publish timestamps
// side_effects: Network calls to api.github.com; spawns `gh` subprocess when needed
// invariants:
// - Token discovery prefers the key file, then GITHUB_TOKEN, then GH_TOKEN, then `gh auth token`
// - An API failure with fewer than RATE_LIMIT_FLOOR requests remaining is RateLimited (fatal)
// - Any other API failure is a non-fatal Api error; the caller treats it as missing release data
// - Draft releases (no published_at) are ignored
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::datastore::{Datastore, RepoRef};
use crate::error::{HealthError, HealthResult};

pub const GITHUB_API: &str = "https://api.github.com";
/// Below this many remaining requests an API failure stops the run.
pub const RATE_LIMIT_FLOOR: u32 = 5;
const PER_PAGE: usize = 100;

/// Read a token from the first line of `path`.
pub fn read_key(path: &Path) -> Result<String> {
  let raw = std::fs::read_to_string(path).with_context(|| format!("reading GitHub key file {}", path.display()))?;
  let key = raw.lines().next().unwrap_or("").trim_end().to_string();

  if key.is_empty() {
    anyhow::bail!("GitHub key file {} is empty", path.display());
  }
  Ok(key)
}

/// Discover a GitHub token: env vars first, then `gh auth token` if available.
pub fn get_github_token() -> Option<String> {
  if let Ok(t) = std::env::var("GITHUB_TOKEN") {
    if !t.trim().is_empty() {
      return Some(t);
    }
  }

  if let Ok(gh_token) = std::env::var("GH_TOKEN") {
    if !gh_token.trim().is_empty() {
      return Some(gh_token);
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();

      if !t.is_empty() {
        return Some(t);
      }
    }
  }

  None
}

/// An explicit key file wins over ambient discovery.
pub fn discover_token(key_file: Option<&Path>) -> Result<Option<String>> {
  match key_file {
    Some(path) => read_key(path).map(Some),
    None => Ok(get_github_token()),
  }
}

/// Where release timestamps come from.
pub trait ReleaseSource {
  /// The repository under its current canonical name (it may have been renamed upstream).
  fn canonical_name(&self, repo: &RepoRef) -> HealthResult<RepoRef>;

  fn releases(&self, repo: &RepoRef) -> HealthResult<Vec<DateTime<Utc>>>;
}

#[derive(Debug, Deserialize)]
struct RepoJson {
  full_name: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseJson {
  #[serde(default)]
  published_at: Option<DateTime<Utc>>,
}

pub struct GithubHttpApi {
  agent: ureq::Agent,
  token: Option<String>,
  base_url: String,
}

impl GithubHttpApi {
  pub fn new(token: Option<String>) -> Self {
    Self::with_base_url(token, GITHUB_API)
  }

  pub fn with_base_url(token: Option<String>, base_url: &str) -> Self {
    let agent = ureq::AgentBuilder::new()
      .timeout(Duration::from_secs(30))
      .user_agent(concat!("project-health/", env!("CARGO_PKG_VERSION")))
      .build();

    Self {
      agent,
      token,
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> HealthResult<T> {
    let mut req = self.agent.get(url).set("Accept", "application/vnd.github+json");

    if let Some(t) = &self.token {
      req = req.set("Authorization", &format!("Bearer {}", t));
    }

    match req.call() {
      Ok(resp) => resp
        .into_json::<T>()
        .map_err(|e| HealthError::Api(format!("decoding {url}: {e}"))),
      Err(ureq::Error::Status(code, resp)) => Err(classify_failure(code, resp.header("x-ratelimit-remaining"), url)),
      Err(e) => Err(HealthError::Api(format!("{url}: {e}"))),
    }
  }
}

fn classify_failure(code: u16, remaining: Option<&str>, url: &str) -> HealthError {
  let remaining = remaining.and_then(|r| r.trim().parse::<u32>().ok());
  tracing::warn!(status = code, url, ?remaining, "GitHub API call failed");

  match remaining {
    Some(n) if n < RATE_LIMIT_FLOOR => HealthError::RateLimited { remaining: n },
    _ => HealthError::Api(format!("HTTP {code} for {url}")),
  }
}

impl ReleaseSource for GithubHttpApi {
  fn canonical_name(&self, repo: &RepoRef) -> HealthResult<RepoRef> {
    let url = format!("{}/repos/{}/{}", self.base_url, repo.org, repo.name);
    let info: RepoJson = self.get_json(&url)?;

    let Some((org, name)) = info.full_name.split_once('/') else {
      return Err(HealthError::Api(format!("unexpected full_name {:?}", info.full_name)));
    };

    if info.full_name.eq_ignore_ascii_case(&repo.full_name()) {
      return Ok(repo.clone());
    }

    tracing::info!(from = %repo.full_name(), to = %info.full_name, "repository was renamed upstream");
    Ok(RepoRef {
      id: repo.id,
      org: org.to_string(),
      name: name.to_string(),
    })
  }

  fn releases(&self, repo: &RepoRef) -> HealthResult<Vec<DateTime<Utc>>> {
    let mut out = Vec::new();
    let mut page = 1;

    loop {
      let url = format!(
        "{}/repos/{}/{}/releases?per_page={}&page={}",
        self.base_url, repo.org, repo.name, PER_PAGE, page
      );
      let batch: Vec<ReleaseJson> = self.get_json(&url)?;
      let n = batch.len();

      out.extend(batch.into_iter().filter_map(|r| r.published_at));

      if n < PER_PAGE {
        break;
      }
      page += 1;
    }

    tracing::debug!(repo = %repo.full_name(), releases = out.len(), pages = page, "fetched releases");
    out.sort();

    Ok(out)
  }
}

/// Releases from the datastore's own releases table; names are taken as stored.
pub struct DatastoreReleases<'a> {
  store: &'a dyn Datastore,
}

impl<'a> DatastoreReleases<'a> {
  pub fn new(store: &'a dyn Datastore) -> Self {
    Self { store }
  }
}

impl ReleaseSource for DatastoreReleases<'_> {
  fn canonical_name(&self, repo: &RepoRef) -> HealthResult<RepoRef> {
    Ok(repo.clone())
  }

  fn releases(&self, repo: &RepoRef) -> HealthResult<Vec<DateTime<Utc>>> {
    self.store.release_dates(repo.id)
  }
}
