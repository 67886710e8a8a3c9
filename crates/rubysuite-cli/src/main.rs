use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use rubysuite_core::{ArtifactProject, Environment, ProjectGraph, Suite, SuiteConfig};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod discovery;
mod executor;
mod init;
mod styles;

use styles as s;

/// The command-line interface for the Ruby suite extension.
#[derive(Debug, Parser)]
#[command(name = "rsuite")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(
    help_template = "{bin} {version}\n\n{about-with-newline}{usage-heading} {usage}\n\n{all-args}{after-help}"
)]
#[command(about = "Suite commands and archive projects for the Ruby build")]
#[command(
    long_about = "rsuite exposes the Ruby suite's commands to the command line and lists
the files each archivable project contributes to a distribution.

Built-in Commands:
  init                       Write a starter suite.toml in the current directory
  projects                   List declared projects
  results <project>          List the files a project contributes

Suite Commands:
  rubytck                    Run the compatibility kit without gem variables
  deploy-binary-if-master    Deploy binaries, only on the master branch
  ruby_testdownstream        Build, then run the fast specs
  ruby_testdownstream_hello  Build, then run a hello-world smoke test
"
)]
#[command(
    after_help = "\x1b[1;32mExamples:\x1b[0m\n  \x1b[36mrsuite projects\x1b[0m                       \x1b[2m# Show archive projects\x1b[0m\n  \x1b[36mrsuite --json results ruby-docs\x1b[0m       \x1b[2m# Files shipped by the docs project\x1b[0m\n  \x1b[36mrsuite deploy-binary-if-master\x1b[0m        \x1b[2m# Deploy when on master\x1b[0m"
)]
pub(crate) struct Cli {
    /// Command to run, either built-in or registered by the suite.
    command: Option<String>,
    /// Arguments passed through to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
    /// Path to the suite config file.
    #[arg(long, default_value = "suite.toml")]
    config: String,
    /// Print listings as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Overwrite generated files if they already exist.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    let command = match &cli.command {
        Some(cmd) => cmd.as_str(),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            return Ok(ExitCode::SUCCESS);
        }
    };

    if command == "init" {
        init::run(&cli, cli.args.first().map(String::as_str))?;
        return Ok(ExitCode::SUCCESS);
    }

    let cfg = SuiteConfig::load_from_file(&cli.config)
        .with_context(|| format!("unable to load config '{}'", cli.config))?;
    let suite_dir = cfg.suite_dir(Path::new(&cli.config));
    let suite_dir = suite_dir
        .canonicalize()
        .with_context(|| format!("suite directory '{}' does not exist", suite_dir.display()))?;
    let suite = Suite::new(cfg.suite.name.clone(), suite_dir);

    // Invalid project declarations abort before any command runs.
    let graph = ProjectGraph::load(&suite, &cfg, cfg.runtime.platform())?;

    let code = execute(&cli, &cfg, &suite, &graph, command)?;
    Ok(exit_code(code))
}

/// Executes a built-in or suite command and returns its exit code.
fn execute(
    cli: &Cli,
    cfg: &SuiteConfig,
    suite: &Suite,
    graph: &ProjectGraph,
    command: &str,
) -> Result<i32> {
    match command {
        "projects" => {
            println!("{}", render_projects(graph, cli.json)?);
            Ok(0)
        }
        "results" => {
            let name = cli
                .args
                .first()
                .ok_or_else(|| anyhow!("usage: rsuite results <project>"))?;
            let project = graph
                .get(name)
                .ok_or_else(|| anyhow!("unknown project '{}'", name))?;
            println!("{}", render_results(project, cli.json)?);
            Ok(0)
        }
        _ => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            let mut env = Environment::from_process();
            discovery::discover_sibling_suites(&cwd, &mut env)?;
            executor::run(cfg, suite, command, &cli.args, env)
        }
    }
}

fn render_projects(graph: &ProjectGraph, as_json: bool) -> Result<String> {
    if graph.is_empty() && !as_json {
        return Ok("no projects declared".to_string());
    }
    if as_json {
        let items = graph
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "kind": p.kind().as_str(),
                    "dependencies": p.dependencies,
                    "license": p.license,
                    "output_dir": p.output_dir(),
                    "archive_prefix": p.archive_prefix(),
                })
            })
            .collect::<Vec<_>>();
        return Ok(serde_json::to_string_pretty(&items)?);
    }

    let lines = graph
        .iter()
        .map(|p| {
            format!(
                "{} {} -> {} {}",
                s::paint(s::COMMAND, &p.name),
                p.kind().as_str(),
                p.archive_prefix(),
                s::paint(s::DESC, &p.output_dir().display().to_string()),
            )
        })
        .collect::<Vec<_>>();
    Ok(lines.join("\n"))
}

fn render_results(project: &ArtifactProject, as_json: bool) -> Result<String> {
    let results = project
        .results()
        .with_context(|| format!("failed to list results of '{}'", project.name))?;
    if as_json {
        return Ok(serde_json::to_string_pretty(&json!({
            "project": project.name,
            "archive_prefix": project.archive_prefix(),
            "files": results,
        }))?);
    }
    Ok(results
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(clamp_code(code))
}

/// Codes outside `0..=255` are reported as a plain failure.
fn clamp_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
