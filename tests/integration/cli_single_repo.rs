use predicates::prelude::*;
use test_support::{cmd_bin, fixtures_dir, read_fixture_json, tempdir, write_json_fixture};

use crate::fixtures::acme_org;

#[test]
fn quiet_repo_skips_pr_metrics() {
  let out = tempdir();
  let fixture = fixtures_dir().join("few_prs.json");

  cmd_bin("project-health")
    .args(["-o", "quietorg", "-r", "sleepy-lib", "--as-of", "2025-10-16"])
    .args(["--release-source", "datastore", "--no-charts"])
    .arg("--fixture")
    .arg(&fixture)
    .arg("--out")
    .arg(out.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("quietorg/sleepy-lib\nForked: False\nArchived: False"))
    .stdout(predicate::str::contains(
      "Activity Release for quietorg/sleepy-lib from 2024-10-01 to 2025-09-30\n1 releases in the past 6 months",
    ))
    .stdout(predicate::str::contains("Closure Ratio skipped: TOO FEW PRs"))
    .stdout(predicate::str::contains("Time to First Response skipped: TOO FEW PRs"))
    .stdout(predicate::str::contains("Summary for").not());

  // single-repo runs never write the org summary
  assert!(!out.path().join("2025-09").exists());
}

#[test]
fn fixture_on_disk_parses() {
  let doc: serde_json::Value = read_fixture_json("few_prs.json");
  assert_eq!(doc["pull_requests"].as_array().map(Vec::len), Some(10));
}

#[test]
fn active_repo_reports_every_metric() {
  let td = tempdir();
  let fixture = write_json_fixture(td.path(), "acme.json", &acme_org());

  let assert = cmd_bin("project-health")
    .args(["-o", "acme", "-r", "Widgets", "--as-of", "2025-10-16"])
    .args(["--release-source", "datastore", "--no-charts"])
    .arg("--fixture")
    .arg(&fixture)
    .arg("--out")
    .arg(td.path().join("out"))
    .assert()
    .success();

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
  assert!(stdout.contains("2 releases in the past 6 months"));
  assert!(stdout.contains("Number of months in the past 6 months with > 15% of PRs not closed: 3"));
  assert!(stdout.contains("2 people make up > 70% of the commits in the past year."));
  assert!(stdout.contains(
    "3 months with more than 15% of pull requests not responded to within 2 business days in the past 6 months"
  ));
  assert!(!stdout.contains("skipped"));
  assert!(!stdout.contains("saved as"));
}
