use std::path::Path;

use anyhow::{bail, Result};
use tracing::{info, instrument};

use rubysuite_core::host::subprocess::ProcessHost;
use rubysuite_core::{CommandRegistry, Environment, Session, Suite, SuiteConfig, VersionControl};

/// Resolves version control only when a command asks for the branch.
#[derive(Debug)]
struct DetectedVersionControl;

impl VersionControl for DetectedVersionControl {
    fn active_branch(&self, root: &Path) -> Result<String> {
        rubysuite_vcs::detect(root)?.active_branch(root)
    }
}

/// Builds the registry the suite exposes.
pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::default();
    rubysuite_commands::register_commands(&mut registry);
    registry
}

/// Runs the suite command `name` and returns its exit code.
#[instrument(skip(cfg, suite, env))]
pub fn run(
    cfg: &SuiteConfig,
    suite: &Suite,
    name: &str,
    args: &[String],
    env: Environment,
) -> Result<i32> {
    let host = ProcessHost::new(cfg.host.program.clone(), suite.dir.clone());
    let vc = DetectedVersionControl;
    let mut session = Session::new(suite, &host, &vc, env);

    let registry = registry();
    if registry.get(name).is_none() {
        bail!(
            "unknown command '{}', expected one of: {}",
            name,
            registry.names().join(", ")
        );
    }

    let code = registry.dispatch(name, &mut session, args)?;
    info!(target: "rubysuite", "{} finished with exit code {}", name, code);
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn create_mock_mx(dir: &TempDir) -> String {
        let path = dir.path().join("mx");
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{log}/calls"
env > "{log}/env"
exit 0
"#,
            log = dir.path().display()
        );
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().to_string()
    }

    fn config(program: &str) -> SuiteConfig {
        let mut cfg: SuiteConfig = toml::from_str(
            r#"
            [suite]
            name = "truffleruby"
            "#,
        )
        .unwrap();
        cfg.host.program = program.to_string();
        cfg
    }

    #[test]
    fn rubytck_runs_unittest_without_gem_variables() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&create_mock_mx(&dir));
        let suite = Suite::new("truffleruby", dir.path());
        let env: Environment = [("PATH", "/usr/bin:/bin"), ("GEM_HOME", "/gems")]
            .into_iter()
            .collect();

        let code = run(&cfg, &suite, "rubytck", &[], env).unwrap();
        assert_eq!(code, 0);

        let calls = fs::read_to_string(dir.path().join("calls")).unwrap();
        assert!(calls.starts_with("unittest -Dpolyglot.ruby.home="));
        assert!(calls.trim_end().ends_with("--verbose --suite truffleruby"));

        let seen = fs::read_to_string(dir.path().join("env")).unwrap();
        assert!(!seen.contains("GEM_HOME"));
    }

    #[test]
    fn unknown_command_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config("mx");
        let suite = Suite::new("truffleruby", dir.path());

        let err = run(&cfg, &suite, "nope", &[], Environment::default()).expect_err("must fail");
        assert!(err.to_string().contains("unknown command 'nope'"));
        assert!(err.to_string().contains("rubytck"));
    }
}
