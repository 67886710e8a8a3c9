use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use rubysuite_core::Environment;

/// A suite that may be checked out next to this one.
struct SiblingSuite {
    dir: &'static str,
    marker: &'static str,
    home_var: &'static str,
}

const SIBLING_SUITES: &[SiblingSuite] = &[SiblingSuite {
    dir: "sulong",
    marker: "mx.sulong/mx_sulong.py",
    home_var: "SULONG_HOME",
}];

/// Points the home variable of every sibling suite found next to `cwd` at
/// its absolute location.
pub fn discover_sibling_suites(cwd: &Path, env: &mut Environment) -> Result<()> {
    for sibling in SIBLING_SUITES {
        let dir = cwd.join("..").join(sibling.dir);
        if !dir.join(sibling.marker).exists() {
            debug!("no sibling suite at {}", dir.display());
            continue;
        }

        let home = dir
            .canonicalize()
            .with_context(|| format!("failed to resolve sibling suite '{}'", dir.display()))?;
        debug!("{}={}", sibling.home_var, home.display());
        env.set(sibling.home_var, home);
    }
    Ok(())
}
