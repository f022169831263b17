use predicates::prelude::*;
use test_support::{cmd_bin, tempdir, write_json_fixture};

use crate::fixtures::acme_org;

#[test]
fn unknown_repo_aborts() {
  let td = tempdir();
  let fixture = write_json_fixture(td.path(), "acme.json", &acme_org());

  cmd_bin("project-health")
    .args(["-o", "acme", "-r", "sprockets", "--release-source", "datastore", "--no-charts"])
    .arg("--fixture")
    .arg(&fixture)
    .arg("--out")
    .arg(td.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid org/repo"));
}

#[test]
fn unknown_org_aborts() {
  let td = tempdir();
  let fixture = write_json_fixture(td.path(), "acme.json", &acme_org());

  cmd_bin("project-health")
    .args(["-o", "nobody", "--release-source", "datastore", "--no-charts"])
    .arg("--fixture")
    .arg(&fixture)
    .arg("--out")
    .arg(td.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("No repositories found for org nobody"));
}

#[test]
fn datastore_is_required() {
  cmd_bin("project-health")
    .args(["-o", "acme"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--config"));
}

#[test]
fn malformed_as_of_is_rejected() {
  let td = tempdir();
  let fixture = write_json_fixture(td.path(), "acme.json", &acme_org());

  cmd_bin("project-health")
    .args(["-o", "acme", "--as-of", "16/10/2025"])
    .arg("--fixture")
    .arg(&fixture)
    .assert()
    .failure()
    .stderr(predicate::str::contains("--as-of"));
}

#[test]
fn absurd_lookback_is_rejected() {
  let td = tempdir();
  let fixture = write_json_fixture(td.path(), "acme.json", &acme_org());

  cmd_bin("project-health")
    .args(["-o", "acme", "--years", "30000000", "--as-of", "2025-10-16"])
    .arg("--fixture")
    .arg(&fixture)
    .assert()
    .failure()
    .stderr(predicate::str::contains("out of range"));
}
