//! Core model and abstractions for the rubysuite build extension.
//!
//! This crate defines the suite configuration, the archivable project model,
//! the command registry, and the ports through which commands reach the host
//! build framework and version control.

pub mod command;
pub mod config;
pub mod constants;
pub mod context;
pub mod host;
pub mod project;
pub mod runtime;
pub mod timestamp;

pub use command::{Command, CommandError, CommandRegistry, Handler};
pub use config::{ProjectConfig, ProjectKindConfig, SuiteConfig};
pub use context::Environment;
pub use host::{Host, Session, Suite, VersionControl};
pub use project::{ArtifactProject, DocFiles, LauncherLink, ProjectError, ProjectGraph, ProjectKind};
pub use runtime::Platform;
pub use timestamp::TimeStampFile;
