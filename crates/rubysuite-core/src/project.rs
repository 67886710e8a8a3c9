//! Archivable projects: named bundles of files with an output location and
//! an archive prefix.
//!
//! Three strategies decide which files a project contributes:
//!
//! - [`ProjectKind::Generic`] walks the project's output directory.
//! - [`ProjectKind::Docs`] returns hand-placed documentation collected once per graph.
//! - [`ProjectKind::Launcher`] materializes the launcher link, then walks.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ProjectConfig, ProjectKindConfig, SuiteConfig};
use crate::constants::{
    DOC_LEGAL_DIR, DOC_MARKDOWN_EXT, DOC_USER_DIR, LAUNCHER_LINK, LAUNCHER_SCRIPT,
    NATIVE_LAUNCHER_DARWIN,
};
use crate::host::Suite;
use crate::runtime::Platform;
use crate::timestamp::TimeStampFile;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project '{project}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        project: String,
        attribute: &'static str,
    },
}

/// Documentation files shared by every docs project of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFiles {
    files: Arc<[PathBuf]>,
}

impl Default for DocFiles {
    fn default() -> Self {
        Self {
            files: Vec::new().into(),
        }
    }
}

impl DocFiles {
    /// Collects `doc/legal/*`, `doc/user/*` and `*.md` under `root`.
    ///
    /// A source that matches nothing, or cannot be read, contributes nothing.
    /// Entries keep the order of the sources and appear once.
    pub fn collect(root: &Path) -> Self {
        let mut files = Vec::new();
        files.extend(list_visible(&root.join(DOC_LEGAL_DIR), |_| true));
        files.extend(list_visible(&root.join(DOC_USER_DIR), |_| true));
        files.extend(list_visible(root, |path| {
            path.extension().is_some_and(|ext| ext == DOC_MARKDOWN_EXT)
        }));

        let mut seen = HashSet::new();
        files.retain(|f| seen.insert(f.clone()));
        debug!("collected {} doc file(s) under {}", files.len(), root.display());

        Self {
            files: files.into(),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Lists the non-hidden entries of `dir` accepted by `keep`, sorted.
///
/// Mirrors a single-level `dir/*` glob: a directory that is absent or
/// cannot be read yields nothing, and unreadable entries are skipped.
fn list_visible(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("skipping {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut out: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| keep(path))
        .collect();
    out.sort();
    out
}

/// Recursively lists every non-directory entry under `dir`.
///
/// Symlinks are listed, not followed. An absent directory yields nothing.
pub fn walk(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    walk_into(dir, &mut out)?;
    Ok(out)
}

fn walk_into(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to walk {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to walk {}", dir.display()))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if file_type.is_dir() {
            walk_into(&path, out)?;
        } else if file_type.is_symlink() && path.is_dir() {
            // Directory symlinks are not descended into, nor listed as files.
            continue;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// The launcher entry point a launcher project exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherLink {
    root: PathBuf,
    platform: Platform,
}

impl LauncherLink {
    pub fn new(root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            root: root.into(),
            platform,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(LAUNCHER_LINK)
    }

    /// Makes sure the launcher exists and, on darwin, is up to date.
    ///
    /// On darwin the native launcher is copied over a missing or older link.
    /// Elsewhere a symlink to the launcher script is created when nothing is
    /// at the link path yet; an existing entry is left alone.
    #[instrument(skip(self), fields(platform = self.platform.as_str()))]
    pub fn link_launcher(&self) -> Result<()> {
        let launcher = self.path();
        if let Some(parent) = launcher.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
        }

        match self.platform {
            Platform::Darwin => {
                let binary = self.root.join(NATIVE_LAUNCHER_DARWIN);
                let stamp = TimeStampFile::new(&launcher);
                if stamp.is_older_than(&binary)? {
                    let action = if stamp.exists() { "refreshing" } else { "creating" };
                    info!("{} {} from {}", action, stamp.path().display(), binary.display());
                    fs::copy(&binary, &launcher).with_context(|| {
                        format!(
                            "failed to copy {} to {}",
                            binary.display(),
                            launcher.display()
                        )
                    })?;
                }
            }
            Platform::Other => {
                // symlink_metadata so a dangling link still counts as present
                if fs::symlink_metadata(&launcher).is_err() {
                    info!("linking {} -> {}", launcher.display(), LAUNCHER_SCRIPT);
                    symlink(Path::new(LAUNCHER_SCRIPT), &launcher).with_context(|| {
                        format!("failed to create symlink {}", launcher.display())
                    })?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// How a project enumerates its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKind {
    Generic,
    Docs(DocFiles),
    Launcher(LauncherLink),
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Docs(_) => "docs",
            Self::Launcher(_) => "launcher",
        }
    }
}

/// A named, licensed bundle of files intended for an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactProject {
    pub name: String,
    pub dir: PathBuf,
    pub dependencies: Vec<String>,
    pub working_sets: Option<String>,
    pub license: Option<String>,
    output_dir: PathBuf,
    archive_prefix: String,
    root: PathBuf,
    kind: ProjectKind,
}

impl ArtifactProject {
    /// Builds a project from its declaration.
    ///
    /// # Errors
    /// Returns [`ProjectError::MissingAttribute`] when `outputDir` or `prefix`
    /// is not declared.
    pub fn new(
        suite: &Suite,
        name: &str,
        config: &ProjectConfig,
        kind: ProjectKind,
    ) -> Result<Self, ProjectError> {
        let missing = |attribute| ProjectError::MissingAttribute {
            project: name.to_string(),
            attribute,
        };
        let archive_prefix = config.prefix.clone().ok_or_else(|| missing("prefix"))?;
        let output_dir = config
            .output_dir
            .clone()
            .ok_or_else(|| missing("outputDir"))?;

        let dir = match &config.dir {
            Some(dir) => suite.dir.join(dir),
            None => suite.dir.clone(),
        };

        Ok(Self {
            name: name.to_string(),
            dir,
            dependencies: config.dependencies.clone(),
            working_sets: config.working_sets.clone(),
            license: config.license.clone(),
            output_dir,
            archive_prefix,
            root: suite.dir.clone(),
            kind,
        })
    }

    /// The project directory joined with the configured output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.dir.join(&self.output_dir)
    }

    pub fn archive_prefix(&self) -> &str {
        &self.archive_prefix
    }

    pub fn kind(&self) -> &ProjectKind {
        &self.kind
    }

    /// Lists the files this project contributes to its archive.
    ///
    /// Launcher projects link the launcher first, which writes to the suite root.
    #[instrument(skip(self), fields(project = %self.name, kind = self.kind.as_str()))]
    pub fn results(&self) -> Result<Vec<PathBuf>> {
        match &self.kind {
            ProjectKind::Generic => walk(&self.output_dir()),
            ProjectKind::Docs(docs) => Ok(docs.files().iter().map(|f| self.root.join(f)).collect()),
            ProjectKind::Launcher(link) => {
                link.link_launcher()?;
                walk(&self.output_dir())
            }
        }
    }
}

/// Every project the suite declares, in name order.
#[derive(Debug, Default)]
pub struct ProjectGraph {
    projects: Vec<ArtifactProject>,
}

impl ProjectGraph {
    /// Constructs all projects declared in `cfg`.
    ///
    /// Documentation is collected once here and shared by every docs project.
    /// The first invalid declaration aborts the load.
    #[instrument(skip(suite, cfg), fields(suite = %suite.name))]
    pub fn load(suite: &Suite, cfg: &SuiteConfig, platform: Platform) -> Result<Self> {
        let needs_docs = cfg
            .projects
            .values()
            .any(|p| p.kind == ProjectKindConfig::Docs);
        let docs = if needs_docs {
            DocFiles::collect(&suite.dir)
        } else {
            DocFiles::default()
        };

        let mut projects = Vec::with_capacity(cfg.projects.len());
        for (name, project) in &cfg.projects {
            let kind = match project.kind {
                ProjectKindConfig::Generic => ProjectKind::Generic,
                ProjectKindConfig::Docs => ProjectKind::Docs(docs.clone()),
                ProjectKindConfig::Launcher => {
                    ProjectKind::Launcher(LauncherLink::new(&suite.dir, platform))
                }
            };
            projects.push(ArtifactProject::new(suite, name, project, kind)?);
        }
        debug!("loaded {} project(s)", projects.len());

        Ok(Self { projects })
    }

    pub fn get(&self, name: &str) -> Option<&ArtifactProject> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactProject> {
        self.projects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn declared(output_dir: Option<&str>, prefix: Option<&str>) -> ProjectConfig {
        ProjectConfig {
            output_dir: output_dir.map(PathBuf::from),
            prefix: prefix.map(ToOwned::to_owned),
            ..ProjectConfig::default()
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn construction_requires_output_dir_and_prefix() {
        let suite = Suite::new("truffleruby", "/work/ruby");

        let err = ArtifactProject::new(&suite, "p", &declared(None, Some("x")), ProjectKind::Generic)
            .expect_err("missing outputDir must fail");
        assert!(matches!(
            err,
            ProjectError::MissingAttribute { attribute: "outputDir", .. }
        ));

        let err = ArtifactProject::new(&suite, "p", &declared(Some("out"), None), ProjectKind::Generic)
            .expect_err("missing prefix must fail");
        assert!(matches!(
            err,
            ProjectError::MissingAttribute { attribute: "prefix", .. }
        ));
        assert!(err.to_string().contains("'p'"));
    }

    #[test]
    fn output_dir_joins_project_dir() {
        let suite = Suite::new("truffleruby", "/work/ruby");
        let project = ArtifactProject::new(
            &suite,
            "bin",
            &declared(Some("mxbuild/out"), Some("lib/ruby")),
            ProjectKind::Generic,
        )
        .unwrap();
        assert_eq!(project.output_dir(), PathBuf::from("/work/ruby/mxbuild/out"));
        assert_eq!(project.archive_prefix(), "lib/ruby");

        let mut nested = declared(Some("out"), Some("p"));
        nested.dir = Some(PathBuf::from("src/launcher"));
        let project = ArtifactProject::new(&suite, "nested", &nested, ProjectKind::Generic).unwrap();
        assert_eq!(project.output_dir(), PathBuf::from("/work/ruby/src/launcher/out"));
    }

    #[test]
    fn generic_results_walk_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("out/a.txt"));
        touch(&root.join("out/nested/b.txt"));
        touch(&root.join("elsewhere/c.txt"));

        let suite = Suite::new("truffleruby", root);
        let project =
            ArtifactProject::new(&suite, "g", &declared(Some("out"), Some("g")), ProjectKind::Generic)
                .unwrap();

        let results = project.results().unwrap();
        assert_eq!(
            results,
            vec![root.join("out/a.txt"), root.join("out/nested/b.txt")]
        );
    }

    #[test]
    fn generic_results_of_missing_output_dir_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let suite = Suite::new("truffleruby", dir.path());
        let project =
            ArtifactProject::new(&suite, "g", &declared(Some("nope"), Some("g")), ProjectKind::Generic)
                .unwrap();
        assert!(project.results().unwrap().is_empty());
    }

    #[test]
    fn doc_files_are_the_union_of_three_sources() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("doc/legal/A"));
        touch(&root.join("doc/user/B"));
        touch(&root.join("TOP.md"));
        touch(&root.join("notes.txt"));
        touch(&root.join("doc/other/C"));
        touch(&root.join("doc/legal/.hidden"));

        let docs = DocFiles::collect(root);
        let got: HashSet<_> = docs.files().iter().cloned().collect();
        let want: HashSet<_> = [
            root.join("doc/legal/A"),
            root.join("doc/user/B"),
            root.join("TOP.md"),
        ]
        .into_iter()
        .collect();
        assert_eq!(got, want);
        assert_eq!(docs.files().len(), 3);
    }

    #[test]
    fn doc_files_tolerate_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("README.md"));

        let docs = DocFiles::collect(dir.path());
        assert_eq!(docs.files(), &[dir.path().join("README.md")]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_doc_dir_contributes_nothing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("doc/legal/LICENSE"));
        touch(&root.join("README.md"));
        let legal = root.join("doc/legal");
        fs::set_permissions(&legal, fs::Permissions::from_mode(0o000)).unwrap();

        let docs = DocFiles::collect(root);

        fs::set_permissions(&legal, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(docs.files().contains(&root.join("README.md")));
        // Privileged users can still read the directory; anyone else sees nothing from it.
        assert!(docs.files().len() <= 2);
    }

    #[test]
    fn docs_results_ignore_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("doc/user/guide.md"));
        touch(&root.join("out/ignored.txt"));

        let suite = Suite::new("truffleruby", root);
        let docs = DocFiles::collect(root);
        let project = ArtifactProject::new(
            &suite,
            "docs",
            &declared(Some("out"), Some("docs")),
            ProjectKind::Docs(docs),
        )
        .unwrap();

        assert_eq!(project.results().unwrap(), vec![root.join("doc/user/guide.md")]);
    }

    #[test]
    fn doc_files_are_computed_once_per_graph() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("CHANGELOG.md"));

        let cfg: SuiteConfig = toml::from_str(
            r#"
            [suite]
            name = "truffleruby"

            [projects.docs-a]
            kind = "docs"
            outputDir = "a"
            prefix = "a"

            [projects.docs-b]
            kind = "docs"
            outputDir = "b"
            prefix = "b"
            "#,
        )
        .unwrap();
        let suite = Suite::new("truffleruby", root);
        let graph = ProjectGraph::load(&suite, &cfg, Platform::Other).unwrap();

        // Files added after load are not picked up.
        touch(&root.join("LATE.md"));

        let a = graph.get("docs-a").unwrap().results().unwrap();
        let b = graph.get("docs-b").unwrap().results().unwrap();
        assert_eq!(a, vec![root.join("CHANGELOG.md")]);
        assert_eq!(a, b);
    }

    #[test]
    fn graph_load_aborts_on_invalid_project() {
        let cfg: SuiteConfig = toml::from_str(
            r#"
            [suite]
            name = "truffleruby"

            [projects.good]
            outputDir = "out"
            prefix = "p"

            [projects.incomplete]
            outputDir = "out"
            "#,
        )
        .unwrap();
        let suite = Suite::new("truffleruby", "/work/ruby");

        let err = ProjectGraph::load(&suite, &cfg, Platform::Other).expect_err("must fail");
        assert!(err.to_string().contains("incomplete"));
    }

    #[cfg(unix)]
    #[test]
    fn launcher_symlink_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let link = LauncherLink::new(dir.path(), Platform::Other);

        link.link_launcher().unwrap();
        let target = fs::read_link(link.path()).unwrap();
        assert_eq!(target, PathBuf::from(LAUNCHER_SCRIPT));
        let first = fs::symlink_metadata(link.path()).unwrap().modified().unwrap();

        link.link_launcher().unwrap();
        assert_eq!(fs::read_link(link.path()).unwrap(), target);
        let second = fs::symlink_metadata(link.path()).unwrap().modified().unwrap();
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn launcher_keeps_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = LauncherLink::new(dir.path(), Platform::Other);
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::os::unix::fs::symlink("missing-launcher.sh", link.path()).unwrap();
        assert!(!link.path().exists());

        link.link_launcher().expect("dangling link counts as present");
        assert_eq!(
            fs::read_link(link.path()).unwrap(),
            PathBuf::from("missing-launcher.sh")
        );
    }

    #[test]
    fn launcher_leaves_existing_file_alone_on_other_platforms() {
        let dir = tempfile::tempdir().unwrap();
        let link = LauncherLink::new(dir.path(), Platform::Other);
        touch(&link.path());

        link.link_launcher().unwrap();
        assert!(fs::symlink_metadata(link.path()).unwrap().file_type().is_file());
    }

    #[test]
    fn darwin_launcher_copies_newer_binary() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let binary = root.join(NATIVE_LAUNCHER_DARWIN);
        let link = LauncherLink::new(root, Platform::Darwin);

        touch(&binary);
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::write(link.path(), b"stale").unwrap();

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&link.path(), base);
        set_mtime(&binary, base + Duration::from_secs(10));

        link.link_launcher().unwrap();
        assert_eq!(fs::read(link.path()).unwrap(), fs::read(&binary).unwrap());
    }

    #[test]
    fn darwin_launcher_keeps_link_that_is_not_older() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let binary = root.join(NATIVE_LAUNCHER_DARWIN);
        let link = LauncherLink::new(root, Platform::Darwin);

        touch(&binary);
        fs::create_dir_all(root.join("bin")).unwrap();
        fs::write(link.path(), b"current").unwrap();

        let base = SystemTime::now() - Duration::from_secs(3600);
        set_mtime(&binary, base);
        set_mtime(&link.path(), base);

        link.link_launcher().unwrap();
        assert_eq!(fs::read(link.path()).unwrap(), b"current");
    }

    #[test]
    fn darwin_launcher_copies_when_link_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let binary = root.join(NATIVE_LAUNCHER_DARWIN);
        touch(&binary);

        let link = LauncherLink::new(root, Platform::Darwin);
        link.link_launcher().unwrap();
        assert_eq!(fs::read(link.path()).unwrap(), fs::read(&binary).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn launcher_results_link_before_walking() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("bin/truffleruby.sh"));

        let suite = Suite::new("truffleruby", root);
        let project = ArtifactProject::new(
            &suite,
            "launcher",
            &declared(Some("bin"), Some("bin")),
            ProjectKind::Launcher(LauncherLink::new(root, Platform::Other)),
        )
        .unwrap();

        let results = project.results().unwrap();
        assert_eq!(
            results,
            vec![root.join("bin/truffleruby"), root.join("bin/truffleruby.sh")]
        );
    }
}
