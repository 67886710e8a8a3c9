//! The commands the Ruby suite contributes to the host build framework.

use anyhow::{bail, Context, Result};
use tracing::{info, instrument};

use rubysuite_core::constants::{GEM_ENV_VARS, PRIMARY_BRANCH};
use rubysuite_core::{Command, CommandRegistry, Session};

/// Spec runner invocation shared by every spec command; extra flags go last.
const RUN_SPECS: &[&str] = &[
    "bin/truffleruby",
    "spec/mspec/bin/mspec",
    "run",
    "--config",
    "spec/truffle.mspec",
    "--format",
    "specdoc",
    "--excl-tag",
    "fails",
];

const HELLO: &[&str] = &["bin/truffleruby", "-e", "puts \"Hello Ruby!\""];

/// Registers the suite's commands with `registry`.
pub fn register_commands(registry: &mut CommandRegistry) {
    registry.update([
        Command::new("rubytck", ruby_tck, ""),
        Command::new("deploy-binary-if-master", deploy_binary_if_master, ""),
        Command::new("ruby_testdownstream", ruby_testdownstream, ""),
        Command::new("ruby_testdownstream_hello", ruby_testdownstream_hello, ""),
    ]);
}

/// Reports versions, then builds the suite.
///
/// # Errors
/// Fails as soon as either host command fails or exits non-zero.
pub fn build_suite(session: &Session<'_>) -> Result<()> {
    for step in ["sversions", "build"] {
        let code = session
            .host_command(step, &[])
            .with_context(|| format!("'{step}' failed"))?;
        if code != 0 {
            bail!("'{}' exited with code {}", step, code);
        }
    }
    Ok(())
}

/// Runs the compatibility kit through the host's unit-test harness.
///
/// Gem variables are dropped from the session first so that a user's gem
/// setup cannot leak into the run.
#[instrument(skip(session))]
pub fn ruby_tck(session: &mut Session<'_>, _args: &[String]) -> Result<i32> {
    for var in GEM_ENV_VARS {
        session.env.remove(var);
    }

    let flags = vec![
        format!("-Dpolyglot.ruby.home={}", session.root().display()),
        "--verbose".to_string(),
        "--suite".to_string(),
        session.suite.name.clone(),
    ];
    session.unittest(&flags)?;
    Ok(0)
}

/// Deploys binaries for the suite, but only from the primary branch.
///
/// Any other branch is a successful no-op.
#[instrument(skip(session))]
pub fn deploy_binary_if_master(session: &mut Session<'_>, args: &[String]) -> Result<i32> {
    let active_branch = session.active_branch()?;
    if active_branch == PRIMARY_BRANCH {
        return session.host_command("deploy-binary", args);
    }

    info!(
        "The active branch is \"{}\". Binaries are deployed only if the active branch is \"{}\".",
        active_branch, PRIMARY_BRANCH
    );
    Ok(0)
}

/// Runs the spec suite with `extra` appended to the fixed runner flags.
pub fn ruby_run_specs(session: &Session<'_>, extra: &[String]) -> Result<()> {
    let mut argv = argv(RUN_SPECS);
    argv.extend_from_slice(extra);
    session.run(&argv)
}

/// Builds, then runs the fast specs.
#[instrument(skip(session))]
pub fn ruby_testdownstream(session: &mut Session<'_>, _args: &[String]) -> Result<i32> {
    build_suite(session)?;
    ruby_run_specs(session, &argv(&["--excl-tag", "slow"]))?;
    Ok(0)
}

/// Builds, then checks the launcher can evaluate a trivial program.
#[instrument(skip(session))]
pub fn ruby_testdownstream_hello(session: &mut Session<'_>, _args: &[String]) -> Result<i32> {
    build_suite(session)?;
    session.run(&argv(HELLO))?;
    Ok(0)
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}
