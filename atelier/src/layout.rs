//! Workspace path resolution and stored credentials.
//!
//! The libraries never invent paths; this layer owns the on-disk layout:
//! one directory per user under the configured base, one subdirectory per
//! project, and an optional per-user remote token file.

use std::path::{Path, PathBuf};

const TOKEN_FILE: &str = ".remote-token";

pub struct WorkspaceLayout {
    base: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn user_dir(&self, owner: &str) -> PathBuf {
        self.base.join(format!("user-{}", owner))
    }

    /// Deterministic workspace directory for a project.
    pub fn project_dir(&self, owner: &str, project: &str) -> PathBuf {
        self.user_dir(owner).join(project)
    }

    /// Stored remote credential for a user; `None` when not configured.
    pub fn credential(&self, owner: &str) -> Option<String> {
        let path = self.user_dir(owner).join(TOKEN_FILE);
        let token = std::fs::read_to_string(path).ok()?;
        let token = token.trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }

    /// Store (or replace) a user's remote credential.
    pub fn store_credential(&self, owner: &str, token: &str) -> std::io::Result<PathBuf> {
        let dir = self.user_dir(owner);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(TOKEN_FILE);
        std::fs::write(&path, token.trim())?;
        Ok(path)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}
