//! Structured records derived from git output.
//!
//! Everything here is recomputed from a fresh subprocess call on every
//! query; the workspace can change underneath us through direct file
//! edits, so none of these types are cached across calls.

use serde::{Deserialize, Serialize};

/// Working-tree state of a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
    Untracked,
    Unknown,
}

impl FileStatus {
    /// Map a two-character porcelain status code, first matching prefix wins.
    pub fn from_code(code: &str) -> Self {
        if code.starts_with('M') {
            FileStatus::Modified
        } else if code.starts_with('A') {
            FileStatus::Added
        } else if code.starts_with('D') {
            FileStatus::Deleted
        } else if code.starts_with('R') {
            FileStatus::Renamed
        } else if code.starts_with('C') {
            FileStatus::Copied
        } else if code.starts_with('U') {
            FileStatus::Unmerged
        } else if code.starts_with('?') {
            FileStatus::Untracked
        } else {
            FileStatus::Unknown
        }
    }
}

/// One line of porcelain status output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatusEntry {
    pub path: String,
    pub status: FileStatus,
}

/// Full working-tree status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceStatus {
    pub files: Vec<FileStatusEntry>,
    pub clean: bool,
}

impl WorkspaceStatus {
    pub fn new(files: Vec<FileStatusEntry>) -> Self {
        let clean = files.is_empty();
        Self { files, clean }
    }
}

/// The most recent commit on the current branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

/// Repository-level metadata, recomputed on every query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Remote URL as stored in the workspace config (may be empty)
    pub url: String,
    /// Display name: last path segment of the remote URL, or the project name
    pub name: String,
    pub current_branch: String,
    pub last_commit: Option<CommitInfo>,
}

/// One local or remote branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    /// Short hash of the branch tip
    pub commit: String,
    /// Summary line of the tip commit
    pub summary: String,
    pub is_current: bool,
    pub is_remote: bool,
}

/// Local and remote branches merged into one listing, deduplicated by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchList {
    pub local: Vec<BranchInfo>,
    pub remote: Vec<BranchInfo>,
    pub current: String,
}

/// One commit in the decorated, graph-annotated log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitGraphNode {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    pub email: String,
    /// ISO-8601 commit date as formatted by git
    pub date: String,
    pub subject: String,
    /// Ref decorations (branch/tag names pointing at this commit)
    pub refs: String,
    /// ASCII graph prefix preceding the commit data on this line
    pub graph: String,
}

/// Chronological commit graph across all refs, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchGraph {
    pub commits: Vec<CommitGraphNode>,
    pub total: usize,
}

/// Stash presence derived from the stash list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashState {
    pub present: bool,
    pub count: usize,
}

/// Result of a mutating operation that can be a deliberate no-op.
///
/// `success = false` means the operation had nothing to do (clean tree,
/// empty stash); it is distinguishable from an error, which is a `GitError`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    pub message: String,
    pub details: String,
}

impl OperationOutcome {
    pub fn done(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn nothing_to_do(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: details.into(),
        }
    }
}

/// Result of a fetch-then-status sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub fetched: String,
    pub status: WorkspaceStatus,
}

/// Identity used for commits when the workspace has none configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    /// Synthesized as `<name>@atelier.local` when absent
    pub email: Option<String>,
}

impl CommitIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Email to configure, falling back to a synthesized local address.
    pub fn effective_email(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}@atelier.local", self.name))
    }
}
