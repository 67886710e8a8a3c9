use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::context::Environment;

pub mod subprocess;

/// The suite this extension belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    /// The suite root every fixed path is resolved against.
    pub dir: PathBuf,
}

impl Suite {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

/// The host build framework, as seen by the suite's commands.
pub trait Host: std::fmt::Debug {
    /// Invokes a command the host itself defines (for example `build`) and
    /// returns its exit code.
    fn command(&self, name: &str, args: &[String], env: &Environment) -> Result<i32>;

    /// Runs `argv` as a child process in `cwd`.
    ///
    /// # Errors
    /// Fails if the process cannot be started or exits unsuccessfully.
    fn run(&self, argv: &[String], cwd: &Path, env: &Environment) -> Result<()>;

    /// Runs the host's unit-test harness with the given flags.
    fn unittest(&self, flags: &[String], env: &Environment) -> Result<()>;
}

/// Read-only access to the version control system holding the suite.
pub trait VersionControl: std::fmt::Debug {
    /// Returns the name of the branch currently checked out at `root`.
    fn active_branch(&self, root: &Path) -> Result<String>;
}

/// The execution context handed to every command handler.
///
/// Handlers change `env` rather than the process environment.
#[derive(Debug)]
pub struct Session<'a> {
    pub suite: &'a Suite,
    pub host: &'a dyn Host,
    pub vc: &'a dyn VersionControl,
    pub env: Environment,
}

impl<'a> Session<'a> {
    pub fn new(
        suite: &'a Suite,
        host: &'a dyn Host,
        vc: &'a dyn VersionControl,
        env: Environment,
    ) -> Self {
        Self {
            suite,
            host,
            vc,
            env,
        }
    }

    pub fn root(&self) -> &Path {
        &self.suite.dir
    }

    /// Delegates to a host command with the session environment.
    pub fn host_command(&self, name: &str, args: &[String]) -> Result<i32> {
        self.host.command(name, args, &self.env)
    }

    /// Runs a process in the suite root with the session environment.
    pub fn run(&self, argv: &[String]) -> Result<()> {
        self.host.run(argv, &self.suite.dir, &self.env)
    }

    pub fn unittest(&self, flags: &[String]) -> Result<()> {
        self.host.unittest(flags, &self.env)
    }

    pub fn active_branch(&self) -> Result<String> {
        self.vc.active_branch(&self.suite.dir)
    }
}
