use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::debug;

/// A file path paired with the modification time observed when it was created.
#[derive(Debug, Clone)]
pub struct TimeStampFile {
    path: PathBuf,
    timestamp: Option<SystemTime>,
}

impl TimeStampFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let timestamp = fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self { path, timestamp }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.timestamp.is_some()
    }

    /// Returns true when this file is absent or strictly older than `other`.
    ///
    /// # Errors
    /// Fails if `other` cannot be stat'ed.
    pub fn is_older_than(&self, other: &Path) -> Result<bool> {
        let Some(mine) = self.timestamp else {
            debug!("timestamp: {} is absent", self.path.display());
            return Ok(true);
        };

        let theirs = fs::metadata(other)
            .and_then(|m| m.modified())
            .with_context(|| format!("failed to read modification time of {}", other.display()))?;

        Ok(mine < theirs)
    }
}
