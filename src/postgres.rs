//! Postgres adapter for an Augur-schema datastore.
//!
//! Queries run on a private current-thread runtime so callers stay synchronous.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tokio::runtime::Runtime;

use crate::config::{BotDenylist, DatastoreConfig};
use crate::contributors::{AliasResolver, AuthorCommits};
use crate::datastore::{Datastore, PullRequestActivity, RepoFlags, RepoRef};
use crate::error::{HealthError, HealthResult};
use crate::series::MonthlyCounts;
use crate::window::{AnalysisWindow, YearMonth};

const RESOLVE_REPO: &str = r#"
SELECT repo.repo_id, repo.repo_name, repo_groups.rg_name
FROM repo
JOIN repo_groups ON repo.repo_group_id = repo_groups.repo_group_id
WHERE LOWER(repo.repo_name) = LOWER($1)
  AND LOWER(repo_groups.rg_name) = LOWER($2)
"#;

const ORG_REPOS: &str = r#"
SELECT repo.repo_id, repo.repo_name, repo_groups.rg_name
FROM repo
JOIN repo_groups ON repo.repo_group_id = repo_groups.repo_group_id
WHERE LOWER(repo_groups.rg_name) = LOWER($1)
ORDER BY repo.repo_name
"#;

const REPO_FLAGS: &str = r#"
SELECT forked_from, repo_archived::int8 AS repo_archived
FROM repo
WHERE repo_name = $1 AND repo_git = $2
LIMIT 1
"#;

const MONTHLY_PR_COUNTS: &str = r#"
SELECT date_trunc('month', pr_created_at)::date AS month,
       COUNT(pr_src_id) AS total,
       COUNT(pr_src_id) FILTER (WHERE pr_src_state = 'closed') AS closed
FROM pull_requests
WHERE repo_id = $1
  AND pr_created_at >= $2
  AND pr_created_at < $3
GROUP BY 1
ORDER BY 1
"#;

const AUTHOR_COMMITS: &str = r#"
SELECT contributors.cntrb_login AS login,
       MIN(contributors.cntrb_email) AS email,
       COUNT(DISTINCT commits.cmt_commit_hash) AS commits
FROM commits
JOIN contributors ON commits.cmt_ght_author_id = contributors.cntrb_id
WHERE commits.repo_id = $1
  AND commits.cmt_author_timestamp >= $2
  AND commits.cmt_author_timestamp < $3
  AND NOT (commits.cmt_author_name LIKE ANY($4))
GROUP BY contributors.cntrb_login
ORDER BY contributors.cntrb_login
"#;

const PR_ACTIVITY: &str = r#"
SELECT pr.pr_created_at::timestamptz AS created_at,
       pr.pr_merged_at::timestamptz AS merged_at,
       pr.pr_closed_at::timestamptz AS closed_at,
       (SELECT MIN(m.msg_timestamp)::timestamptz
          FROM pull_request_message_ref ref
          JOIN message m ON ref.pr_message_ref_src_comment_id = m.platform_msg_id
          LEFT JOIN contributors c ON m.cntrb_id = c.cntrb_id
         WHERE ref.pull_request_id = pr.pull_request_id
           AND (c.cntrb_login IS NULL OR c.cntrb_login NOT LIKE '%[bot]')) AS first_comment_at,
       (SELECT MIN(rv.pr_review_submitted_at)::timestamptz
          FROM pull_request_reviews rv
         WHERE rv.pull_request_id = pr.pull_request_id) AS first_review_at
FROM pull_requests pr
WHERE pr.repo_id = $1
  AND pr.pr_created_at >= $2
  AND pr.pr_created_at < $3
ORDER BY pr.pr_created_at
"#;

const RELEASE_DATES: &str = r#"
SELECT release_published_at::timestamptz AS published_at
FROM releases
WHERE repo_id = $1 AND release_published_at IS NOT NULL
ORDER BY release_published_at
"#;

pub struct PostgresStore {
  runtime: Runtime,
  pool: PgPool,
  aliases: AliasResolver,
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> HealthResult<T>
where
  T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
  row
    .try_get(name)
    .map_err(|e| HealthError::datastore(format!("column {name}: {e}")))
}

fn repo_ref(row: &PgRow) -> HealthResult<RepoRef> {
  Ok(RepoRef {
    id: column(row, "repo_id")?,
    name: column(row, "repo_name")?,
    org: column(row, "rg_name")?,
  })
}

fn count(row: &PgRow, name: &str) -> HealthResult<u64> {
  let n: i64 = column(row, name)?;
  Ok(n.max(0) as u64)
}

impl PostgresStore {
  pub fn connect(config: &DatastoreConfig) -> HealthResult<Self> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    let pool = runtime
      .block_on(
        PgPoolOptions::new()
          .max_connections(2)
          .acquire_timeout(Duration::from_secs(30))
          .connect_with(config.connect_options()),
      )
      .map_err(|e| HealthError::datastore(format!("connecting to {}:{}: {e}", config.host, config.port)))?;

    tracing::info!(host = %config.host, database = %config.database, schema = %config.schema, "connected to datastore");

    Ok(Self {
      runtime,
      pool,
      aliases: AliasResolver::new(&config.identity_aliases),
    })
  }

  fn fetch_all(&self, query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>) -> HealthResult<Vec<PgRow>> {
    Ok(self.runtime.block_on(query.fetch_all(&self.pool))?)
  }
}

impl Datastore for PostgresStore {
  fn resolve_repo(&self, org: &str, repo: &str) -> HealthResult<Option<RepoRef>> {
    let rows = self.fetch_all(sqlx::query(RESOLVE_REPO).bind(repo).bind(org))?;

    if rows.len() != 1 {
      tracing::debug!(org, repo, matches = rows.len(), "repository did not resolve uniquely");
      return Ok(None);
    }
    repo_ref(&rows[0]).map(Some)
  }

  fn org_repos(&self, org: &str) -> HealthResult<Vec<RepoRef>> {
    self
      .fetch_all(sqlx::query(ORG_REPOS).bind(org))?
      .iter()
      .map(repo_ref)
      .collect()
  }

  fn repo_flags(&self, repo: &RepoRef) -> HealthResult<RepoFlags> {
    let rows = self.fetch_all(sqlx::query(REPO_FLAGS).bind(&repo.name).bind(repo.git_url()))?;

    let Some(row) = rows.first() else {
      return Ok(RepoFlags::default());
    };
    let forked: Option<String> = column(row, "forked_from")?;
    let archived: Option<i64> = column(row, "repo_archived")?;

    Ok(RepoFlags::from_columns(forked.as_deref(), archived))
  }

  fn monthly_pr_counts(&self, repo_id: i64, window: &AnalysisWindow) -> HealthResult<Vec<MonthlyCounts>> {
    let rows = self.fetch_all(
      sqlx::query(MONTHLY_PR_COUNTS)
        .bind(repo_id)
        .bind(window.start_ts())
        .bind(window.end_ts()),
    )?;

    rows
      .iter()
      .map(|row| {
        let month: NaiveDate = column(row, "month")?;
        Ok(MonthlyCounts::new(
          YearMonth::of_date(month),
          count(row, "total")?,
          count(row, "closed")?,
        ))
      })
      .collect()
  }

  fn author_commits(
    &self,
    repo_id: i64,
    window: &AnalysisWindow,
    denylist: &BotDenylist,
  ) -> HealthResult<Vec<AuthorCommits>> {
    let rows = self.fetch_all(
      sqlx::query(AUTHOR_COMMITS)
        .bind(repo_id)
        .bind(window.start_ts())
        .bind(window.end_ts())
        .bind(denylist.patterns().to_vec()),
    )?;

    rows
      .iter()
      .map(|row| {
        Ok(AuthorCommits {
          login: column(row, "login")?,
          email: column(row, "email")?,
          commits: count(row, "commits")?,
        })
      })
      .collect()
  }

  fn pr_activity(&self, repo_id: i64, window: &AnalysisWindow) -> HealthResult<Vec<PullRequestActivity>> {
    let rows = self.fetch_all(
      sqlx::query(PR_ACTIVITY)
        .bind(repo_id)
        .bind(window.start_ts())
        .bind(window.end_ts()),
    )?;

    rows
      .iter()
      .map(|row| {
        Ok(PullRequestActivity {
          created_at: column(row, "created_at")?,
          merged_at: column(row, "merged_at")?,
          closed_at: column(row, "closed_at")?,
          first_comment_at: column(row, "first_comment_at")?,
          first_review_at: column(row, "first_review_at")?,
        })
      })
      .collect()
  }

  fn release_dates(&self, repo_id: i64) -> HealthResult<Vec<DateTime<Utc>>> {
    self
      .fetch_all(sqlx::query(RELEASE_DATES).bind(repo_id))?
      .iter()
      .map(|row| column(row, "published_at"))
      .collect()
  }

  fn identity_resolver(&self) -> AliasResolver {
    self.aliases.clone()
  }
}
