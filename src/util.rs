// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Small helpers for paths, operator-facing flag text, and man page rendering
// role: utilities/helpers
// inputs: Paths; optional booleans; clap CommandFactory
// outputs: Absolute path strings, flag labels, man page text
// invariants:
// - canonicalize_lossy never fails; it falls back to cwd-joined or raw paths
// errors: render_man_page surfaces clap_mangen IO errors
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use clap::CommandFactory;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

/// `True` / `False`, or `unknown` when the datastore could not say.
pub fn flag_label(flag: Option<bool>) -> &'static str {
  match flag {
    Some(true) => "True",
    Some(false) => "False",
    None => "unknown",
  }
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
