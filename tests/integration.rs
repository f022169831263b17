// Driver for CLI integration tests under tests/integration/
// Keeps tests organized in a subdirectory while remaining visible to Cargo.
//
#[path = "integration/fixtures.rs"]
mod fixtures;

#[path = "integration/cli_errors.rs"]
mod cli_errors;
#[path = "integration/cli_gen_man.rs"]
mod cli_gen_man;
#[path = "integration/cli_org_summary.rs"]
mod cli_org_summary;
#[path = "integration/cli_single_repo.rs"]
mod cli_single_repo;
