use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use crate::Cli;
use tracing::{info, instrument};

/// Runs the `init` command to write a starter suite configuration.
#[instrument(skip(cli))]
pub fn run(cli: &Cli, suite_name: Option<&str>) -> Result<()> {
    let name = match suite_name {
        Some(name) => name.to_string(),
        None => detect_suite_name()?,
    };

    write_if_absent(&cli.config, &render_config(&name), cli.force)
        .with_context(|| format!("failed to write '{}'", cli.config))?;

    // Validate what was just written the same way every later command will.
    rubysuite_core::SuiteConfig::load_from_file(&cli.config)?;

    info!("init complete: suite={}, config={}", name, cli.config);
    println!("next: run 'rsuite projects'");

    Ok(())
}

fn detect_suite_name() -> Result<String> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let name = cwd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "truffleruby".to_string());
    Ok(name)
}

fn render_config(name: &str) -> String {
    format!(
        r#"[suite]
name = "{name}"

[host]
program = "mx"

[projects.{name}-docs]
kind = "docs"
license = "EPL-2.0"
outputDir = "doc"
prefix = "doc"

[projects.{name}-launcher]
kind = "launcher"
dependencies = ["{name}-docs"]
license = "EPL-2.0"
outputDir = "bin"
prefix = "bin"
"#
    )
}

fn write_if_absent(path: &str, content: &str, force: bool) -> Result<()> {
    let output = Path::new(path);
    if output.exists() && !force {
        bail!("'{}' already exists (use --force to overwrite)", path);
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    fs::write(output, content).with_context(|| format!("failed to write '{}'", output.display()))
}
