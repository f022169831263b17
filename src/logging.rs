//! Diagnostic logging to stderr. Report lines go to stdout and never pass through here.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default directive for a `-v` count; `RUST_LOG` overrides it entirely.
pub fn default_directive(verbose: u8) -> &'static str {
  match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  }
}

pub fn init(verbose: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

  // a second init (tests) is harmless
  let _ = tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(filter)
    .try_init();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verbosity_maps_to_levels() {
    assert_eq!(default_directive(0), "warn");
    assert_eq!(default_directive(1), "info");
    assert_eq!(default_directive(2), "debug");
    assert_eq!(default_directive(9), "debug");
  }

  #[test]
  fn init_twice_is_fine() {
    init(0);
    init(2);
  }
}
