//! Git backup
//!
//! Stages everything, commits with a timestamp message, and pushes.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{DhubError, Result};

use super::{Mutation, Notifier};

/// Commit message format, e.g. "18/10/2026 21:03:17"
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Backs up the repository containing the data directory via git
#[derive(Debug, Clone)]
pub struct GitBackup {
    /// Working directory the git commands run in
    repo_dir: PathBuf,
}

impl GitBackup {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Run `git add .`, `git commit -m <timestamp>`, `git push`
    ///
    /// Stops at the first step that fails to spawn or exits non-zero.
    pub fn run(&self) -> Result<()> {
        let message = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        tracing::info!("Syncing data: {}", message);

        self.git(&["add", "."])?;
        self.git(&["commit", "-m", &message])?;
        self.git(&["push"])?;

        Ok(())
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| DhubError::Backup(format!("failed to spawn git {}: {}", args[0], e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DhubError::Backup(format!(
                "git {} exited with {}: {}",
                args[0],
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Notifier for GitBackup {
    fn on_mutation(&self, mutation: &Mutation) {
        if let Err(e) = self.run() {
            tracing::warn!("Backup after {} failed: {}", mutation, e);
        }
    }
}
