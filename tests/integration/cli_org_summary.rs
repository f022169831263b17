use test_support::{cmd_bin, init_insta, tempdir, write_json_fixture};

use crate::fixtures::acme_org;

#[test]
fn whole_org_run_writes_summary_csv() {
  init_insta();
  let td = tempdir();
  let fixture = write_json_fixture(td.path(), "acme.json", &acme_org());
  let out = td.path().join("out");

  let assert = cmd_bin("project-health")
    .args(["-o", "acme", "--as-of", "2025-10-16"])
    .args(["--release-source", "datastore", "--no-charts"])
    .arg("--fixture")
    .arg(&fixture)
    .arg("--out")
    .arg(&out)
    .assert()
    .success();

  let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
  // repositories run in name order
  let gadgets = stdout.find("acme/gadgets").unwrap();
  let widgets = stdout.find("acme/widgets").unwrap();
  assert!(gadgets < widgets);
  assert!(stdout.contains("acme/gadgets\nForked: True\nArchived: True"));
  assert!(stdout.contains("Activity Release skipped: NO DATA"));
  assert!(stdout.contains("Summary for acme written to"));

  let csv_path = out.join("2025-09").join("acme").join("acme_health_summary.csv");
  let csv = std::fs::read_to_string(&csv_path).unwrap();
  insta::assert_snapshot!(csv, @r"
  org,repo,release_count,first_response_breach_months,closure_breach_months,bus_factor_n,bus_factor_percents,is_fork,is_archived
  acme,gadgets,,,,,,true,true
  acme,widgets,2,3,3,2,0.6666666666666666--0.3333333333333333,false,false
  ");
}
