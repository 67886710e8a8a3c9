use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::{debug, instrument};

use crate::context::Environment;
use crate::host::Host;

/// A host that drives the build framework through its command-line program.
#[derive(Debug)]
pub struct ProcessHost {
    program: String,
    root: PathBuf,
}

impl ProcessHost {
    /// Creates a host invoking `program` with `root` as working directory.
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
        }
    }

    fn spawn(&self, program: &str, args: &[String], cwd: &Path, env: &Environment) -> Result<i32> {
        debug!("spawning '{} {}' in {}", program, args.join(" "), cwd.display());
        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env_clear()
            .envs(env.iter())
            .status()
            .with_context(|| format!("failed to start command '{} {}'", program, args.join(" ")))?;

        // A signal-terminated child has no code; report it as a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

impl Host for ProcessHost {
    #[instrument(skip(self, env))]
    fn command(&self, name: &str, args: &[String], env: &Environment) -> Result<i32> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(name.to_string());
        full.extend_from_slice(args);
        self.spawn(&self.program, &full, &self.root, env)
    }

    #[instrument(skip(self, env))]
    fn run(&self, argv: &[String], cwd: &Path, env: &Environment) -> Result<()> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("empty command argv"))?;

        let code = self.spawn(program, args, cwd, env)?;
        if code != 0 {
            bail!(
                "command failed with exit code {}: {} {}",
                code,
                program,
                args.join(" ")
            );
        }
        Ok(())
    }

    #[instrument(skip(self, env))]
    fn unittest(&self, flags: &[String], env: &Environment) -> Result<()> {
        let mut full = Vec::with_capacity(flags.len() + 1);
        full.push("unittest".to_string());
        full.extend_from_slice(flags);

        let code = self.spawn(&self.program, &full, &self.root, env)?;
        if code != 0 {
            bail!("unittest failed with exit code {}", code);
        }
        Ok(())
    }
}
