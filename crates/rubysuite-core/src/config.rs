use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::DEFAULT_HOST_PROGRAM;
use crate::runtime::Platform;

#[derive(Debug, Deserialize)]
pub struct SuiteConfig {
    pub suite: SuiteSection,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

impl SuiteConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let cfg = toml::from_str::<Self>(&text)
            .with_context(|| format!("failed to parse TOML config: {path}"))?;
        Ok(cfg)
    }

    /// Resolves the suite root for a config loaded from `config_path`.
    ///
    /// A relative `[suite].dir` is taken relative to the config file's directory.
    pub fn suite_dir(&self, config_path: &Path) -> PathBuf {
        let base = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        match &self.suite.dir {
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SuiteSection {
    pub name: String,
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RuntimeConfig {
    /// Pins the launcher platform instead of detecting it.
    pub platform: Option<Platform>,
}

impl RuntimeConfig {
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_program")]
    pub program: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            program: default_host_program(),
        }
    }
}

fn default_host_program() -> String {
    DEFAULT_HOST_PROGRAM.to_string()
}

/// Declaration of a single archivable project.
///
/// `output_dir` and `prefix` are optional here so that their absence surfaces
/// as a project construction error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub kind: ProjectKindConfig,
    /// Project directory relative to the suite root.
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, alias = "workingSets")]
    pub working_sets: Option<String>,
    pub license: Option<String>,
    #[serde(default, alias = "outputDir")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, alias = "archive_prefix")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKindConfig {
    #[default]
    Generic,
    Docs,
    Launcher,
}
