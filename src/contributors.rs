// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Canonical author merging, contributor ranking and the bus factor number
// role: aggregation/contributors
// inputs: AuthorCommits rows from the datastore; alias map
// outputs: Ranked ContributorRecord list and BusFactor summary
// invariants:
// - commit_share is computed against the full commit total, before the top-N cut
// - ranking is commit count descending, ties lexical by display name
// - bus factor is the smallest prefix whose cumulative share exceeds the threshold, capped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Share of all commits the top contributors must exceed.
pub const BUS_FACTOR_SHARE: f64 = 0.70;
/// Most contributors shown and counted.
pub const BUS_FACTOR_CAP: usize = 8;

/// Commit count for one author identity as reported by the datastore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCommits {
  pub login: String,
  #[serde(default)]
  pub email: Option<String>,
  pub commits: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContributorRecord {
  pub display_name: String,
  pub commit_count: u64,
  pub commit_share: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BusFactor {
  pub num_people: usize,
  /// At most `cap` entries, ranked.
  pub top: Vec<ContributorRecord>,
}

/// Resolves the many logins/emails of one human into a single canonical identity.
pub trait IdentityResolver {
  fn merge_identities(&self, rows: Vec<AuthorCommits>) -> Vec<AuthorCommits>;
}

/// Merges rows whose logins match case-insensitively, plus explicit aliases
/// (login or email → canonical login).
#[derive(Clone, Debug, Default)]
pub struct AliasResolver {
  aliases: HashMap<String, String>,
}

impl AliasResolver {
  pub fn new(aliases: &HashMap<String, String>) -> Self {
    Self {
      aliases: aliases
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect(),
    }
  }

  fn canonical(&self, row: &AuthorCommits) -> String {
    let by_login = self.aliases.get(&row.login.to_lowercase());
    let by_email = row
      .email
      .as_ref()
      .and_then(|e| self.aliases.get(&e.to_lowercase()));

    by_login.or(by_email).cloned().unwrap_or_else(|| row.login.clone())
  }
}

impl IdentityResolver for AliasResolver {
  fn merge_identities(&self, rows: Vec<AuthorCommits>) -> Vec<AuthorCommits> {
    // key (lowercased canonical) → index into out; first spelling seen wins
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<AuthorCommits> = Vec::new();

    for row in rows {
      let canonical = self.canonical(&row);
      let key = canonical.to_lowercase();

      match index.get(&key) {
        Some(&i) => out[i].commits += row.commits,
        None => {
          index.insert(key, out.len());
          out.push(AuthorCommits {
            login: canonical,
            email: row.email,
            commits: row.commits,
          });
        }
      }
    }

    out
  }
}

/// Sort contributors by commits (descending, ties lexical by name) and attach shares of the total.
pub fn rank_contributors(rows: Vec<AuthorCommits>) -> Vec<ContributorRecord> {
  let total: u64 = rows.iter().map(|r| r.commits).sum();
  let mut ranked: Vec<AuthorCommits> = rows.into_iter().filter(|r| r.commits > 0).collect();

  ranked.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.login.cmp(&b.login)));

  ranked
    .into_iter()
    .map(|r| ContributorRecord {
      commit_share: r.commits as f64 / total as f64,
      display_name: r.login,
      commit_count: r.commits,
    })
    .collect()
}

/// Smallest number of top contributors whose combined share exceeds `threshold`, capped at `cap`.
///
/// Returns `None` when there are no contributors.
pub fn bus_factor(ranked: &[ContributorRecord], threshold: f64, cap: usize) -> Option<BusFactor> {
  if ranked.is_empty() || cap == 0 {
    return None;
  }

  let total: u64 = ranked.iter().map(|r| r.commit_count).sum();
  let top: Vec<ContributorRecord> = ranked.iter().take(cap).cloned().collect();
  let mut cumulative: u64 = 0;
  let mut num_people = top.len();

  for (i, person) in top.iter().enumerate() {
    cumulative += person.commit_count;
    // share of the grand total, recomputed from integers to avoid summing rounded shares
    if cumulative as f64 / total as f64 > threshold {
      num_people = i + 1;
      break;
    }
  }

  Some(BusFactor { num_people, top })
}

/// Wrap a display name at `width` characters for axis labels.
pub fn wrap_name(name: &str, width: usize) -> String {
  if width == 0 || name.chars().count() <= width {
    return name.to_string();
  }
  let chars: Vec<char> = name.chars().collect();
  chars
    .chunks(width)
    .map(|c| c.iter().collect::<String>())
    .collect::<Vec<_>>()
    .join("\n")
}
