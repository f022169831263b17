use anyhow::Result;
use clap::Parser;

mod artifacts;
mod chart;
mod cli;
mod config;
mod contributors;
mod datastore;
mod error;
mod fixture;
mod github;
mod logging;
mod metrics;
mod postgres;
mod report;
mod runner;
mod series;
mod trend;
mod util;
mod window;

use crate::cli::{normalize, Cli};

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  logging::init(cli.verbose);

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;
  tracing::debug!(config = ?cfg, "effective configuration");

  // Phase 2: resolve repositories and run every metric
  runner::execute(&cfg)
}
