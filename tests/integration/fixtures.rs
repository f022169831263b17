use serde_json::{json, Value};

/// Three PRs a month from 2024-10 through 2025-09 for `repo_id`; one per month in
/// June, July and August stays open and only hears back five days later.
fn steady_prs(repo_id: i64) -> Vec<Value> {
  let months = (10..=12).map(|m| (2024, m)).chain((1..=9).map(|m| (2025, m)));
  let mut prs = Vec::new();

  for (year, month) in months {
    for n in 0..3 {
      let created = format!("{year}-{month:02}-{:02}T09:00:00Z", 5 + n);
      let lagging = year == 2025 && (6..=8).contains(&month) && n == 0;
      if lagging {
        prs.push(json!({
          "repo_id": repo_id,
          "created_at": created,
          "state": "open",
          "comments": [{"login": "maintainer", "at": format!("{year}-{month:02}-10T09:00:00Z")}]
        }));
      } else {
        prs.push(json!({
          "repo_id": repo_id,
          "created_at": created,
          "closed_at": format!("{year}-{month:02}-{:02}T09:00:00Z", 6 + n)
        }));
      }
    }
  }

  prs
}

fn commit(repo_id: i64, hash: &str, name: &str, login: &str, at: &str) -> Value {
  json!({"repo_id": repo_id, "hash": hash, "author_name": name, "login": login, "authored_at": at})
}

/// `acme/widgets` is active and healthy apart from a slow summer; `acme/gadgets` is an
/// archived fork with too little activity for any metric.
pub fn acme_org() -> Value {
  let mut prs = steady_prs(1);
  prs.extend((1..=10).map(|d| json!({"repo_id": 2, "created_at": format!("2025-03-{d:02}T12:00:00Z")})));

  let mut commits: Vec<Value> = (0..6)
    .map(|i| commit(1, &format!("ann{i}"), "Ann Lee", "ann", &format!("2025-0{}-02T10:00:00Z", i + 1)))
    .collect();
  commits.extend((0..3).map(|i| commit(1, &format!("bob{i}"), "Bob Ray", "bob", &format!("2025-0{}-03T10:00:00Z", i + 4))));
  commits.push(commit(1, "dep0", "dependabot[bot]", "dependabot", "2025-05-01T10:00:00Z"));

  json!({
    "repos": [
      {"id": 1, "org": "acme", "name": "widgets", "archived": 0},
      {"id": 2, "org": "acme", "name": "gadgets", "forked_from": "upstream/gadgets", "archived": 1}
    ],
    "pull_requests": prs,
    "commits": commits,
    "releases": [
      {"repo_id": 1, "published_at": "2024-12-01T12:00:00Z"},
      {"repo_id": 1, "published_at": "2025-08-01T12:00:00Z"},
      {"repo_id": 1, "published_at": "2025-09-20T12:00:00Z"}
    ]
  })
}
