use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, instrument};

use rubysuite_core::VersionControl;

/// Queries a git checkout through the `git` executable.
#[derive(Debug, Default)]
pub struct GitVersionControl;

impl VersionControl for GitVersionControl {
    #[instrument(skip(self))]
    fn active_branch(&self, root: &Path) -> Result<String> {
        let output = Command::new("git")
            .args(["symbolic-ref", "--short", "HEAD"])
            .current_dir(root)
            .output()
            .with_context(|| format!("failed to run git in '{}'", root.display()))?;

        if !output.status.success() {
            bail!(
                "cannot determine active branch of '{}': {}",
                root.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let branch = parse_branch(&output.stdout)?;
        debug!("active branch of {} is {}", root.display(), branch);
        Ok(branch)
    }
}

fn parse_branch(stdout: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(stdout).context("git printed a non UTF-8 branch name")?;
    let branch = text.trim();
    if branch.is_empty() {
        return Err(anyhow!("git printed no branch name"));
    }
    Ok(branch.to_string())
}

/// Finds the version control system managing `root`.
///
/// # Errors
/// Fails when neither `root` nor any ancestor holds a `.git` entry.
pub fn detect(root: &Path) -> Result<Box<dyn VersionControl>> {
    let found = root.ancestors().any(|dir| dir.join(".git").exists());
    if !found {
        bail!("no version control found for '{}'", root.display());
    }
    Ok(Box::new(GitVersionControl))
}
