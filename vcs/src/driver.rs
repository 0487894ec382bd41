//! Workspace repository driver.
//!
//! Orchestrates the command executor and the output parsers to implement
//! repository-level operations against one workspace directory. Every
//! operation re-checks the workspace precondition (directory present,
//! `.git` metadata present) before spawning anything, and every git
//! subprocess runs with terminal prompts disabled so a credential prompt
//! can never hang an operation.
//!
//! The driver holds no lock: callers are expected to serialize operations
//! per workspace (the filesystem is the shared resource).

use crate::auth::{authenticated_url, normalize_remote_url};
use crate::command::{run_command, CommandError};
use crate::parser;
use crate::types::{
    BranchGraph, BranchList, CommitIdentity, OperationOutcome, RepositoryInfo, StashState,
    SyncResult, WorkspaceStatus,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default number of commits returned by the branch graph
const DEFAULT_GRAPH_LIMIT: usize = 50;

/// Errors produced by workspace repository operations
#[derive(Error, Debug)]
pub enum GitError {
    /// The workspace directory does not exist
    #[error("workspace directory not found: {}", path.display())]
    WorkspaceMissing { path: PathBuf },

    /// The workspace exists but holds no version-control metadata
    #[error("workspace is not a git repository: {}", path.display())]
    MetadataMissing { path: PathBuf },

    /// The operation needs a stored remote credential and none is configured
    #[error("no remote credential is configured; store a hosting token for this user to enable authenticated pushes")]
    CredentialMissing,

    /// A git subprocess exited non-zero; stderr is carried verbatim
    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    /// Filesystem error while preparing a workspace
    #[error("workspace io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type GitResult<T> = Result<T, GitError>;

fn wrap(operation: &str, err: CommandError) -> GitError {
    let stderr = match err {
        CommandError::Failed { stderr, .. } => stderr.trim().to_string(),
        CommandError::Spawn { source, .. } => source.to_string(),
    };
    GitError::CommandFailed {
        operation: operation.to_string(),
        stderr,
    }
}

/// Driver for one workspace directory.
pub struct WorkspaceRepository {
    path: PathBuf,
}

impl WorkspaceRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Precondition for every operation: the directory exists and carries
    /// git metadata. Checked before any subprocess is spawned.
    fn ensure_repository(&self) -> GitResult<()> {
        if !self.path.is_dir() {
            return Err(GitError::WorkspaceMissing {
                path: self.path.clone(),
            });
        }
        if !self.path.join(".git").exists() {
            return Err(GitError::MetadataMissing {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    fn git(&self, operation: &str, args: &[&str]) -> GitResult<String> {
        debug!(operation, "running git");
        run_command("git", args, &self.path, &[("GIT_TERMINAL_PROMPT", "0")])
            .map(|output| output.stdout)
            .map_err(|err| wrap(operation, err))
    }

    /// Like [`Self::git`] but a non-zero exit is `Ok(None)` rather than an
    /// error; only a spawn failure propagates. Used for queries that are
    /// legitimately absent (unset config keys, empty history).
    fn git_optional(&self, operation: &str, args: &[&str]) -> GitResult<Option<String>> {
        match run_command("git", args, &self.path, &[("GIT_TERMINAL_PROMPT", "0")]) {
            Ok(output) => Ok(Some(output.stdout)),
            Err(CommandError::Failed { .. }) => Ok(None),
            Err(err) => Err(wrap(operation, err)),
        }
    }

    /// Parse the working-tree status; `clean` when no entries remain.
    pub fn status(&self) -> GitResult<WorkspaceStatus> {
        self.ensure_repository()?;
        let output = self.git("status", &["status", "--porcelain"])?;
        Ok(parser::parse_status(&output))
    }

    /// Remote URL, current branch and most recent commit, recomputed fresh.
    pub fn repository_info(&self, fallback_name: &str) -> GitResult<RepositoryInfo> {
        self.ensure_repository()?;

        let url = self
            .git_optional("repository info", &["config", "--get", "remote.origin.url"])?
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        let current_branch = self
            .git("repository info", &["branch", "--show-current"])?
            .trim()
            .to_string();

        let last_commit = self
            .git_optional(
                "repository info",
                &["log", "-1", "--pretty=format:%H|%s|%an|%ad", "--date=iso"],
            )?
            .and_then(|output| parser::parse_last_commit(&output));

        let name = parser::repository_display_name(&url, fallback_name);

        Ok(RepositoryInfo {
            url,
            name,
            current_branch,
            last_commit,
        })
    }

    /// Stage the named files (or everything) and commit. Fails when there
    /// is nothing staged; the identity is configured first when the
    /// workspace has none.
    pub fn commit(
        &self,
        message: &str,
        files: &[String],
        identity: &CommitIdentity,
    ) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        self.ensure_identity(identity)?;

        if files.is_empty() {
            self.git("commit", &["add", "."])?;
        } else {
            for file in files {
                self.git("commit", &["add", file])?;
            }
        }

        let output = self.git("commit", &["commit", "-m", message])?;
        info!(workspace = %self.path.display(), "created commit");
        Ok(OperationOutcome::done("commit created", output.trim()))
    }

    /// Push a branch to the remote. Requires a stored credential; the
    /// authenticated URL is passed to this one invocation and never
    /// written into the workspace config.
    pub fn push(&self, branch: &str, token: Option<&str>) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        let token = token.ok_or(GitError::CredentialMissing)?;
        let target = self.remote_target(Some(token))?;

        let output = self.git("push", &["push", &target, branch])?;
        info!(branch, "pushed changes");
        Ok(OperationOutcome::done("changes pushed", output.trim()))
    }

    /// Pull a branch from the remote, authenticated when a credential is
    /// stored and the remote URL is eligible, unauthenticated otherwise.
    pub fn pull(&self, branch: &str, token: Option<&str>) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        let target = self.remote_target(token)?;

        let output = self.git("pull", &["pull", &target, branch])?;
        info!(branch, "pulled changes");
        Ok(OperationOutcome::done("changes pulled", output.trim()))
    }

    /// Fetch the remote and report the resulting working-tree status.
    pub fn sync(&self, token: Option<&str>) -> GitResult<SyncResult> {
        self.ensure_repository()?;
        let target = self.remote_target(token)?;

        let fetched = if target == "origin" {
            self.git("sync", &["fetch", "origin"])?
        } else {
            // A bare-URL fetch only updates FETCH_HEAD; the explicit refspec
            // keeps the origin/* tracking refs advancing.
            self.git(
                "sync",
                &["fetch", &target, "+refs/heads/*:refs/remotes/origin/*"],
            )?
        };

        let status = self.status()?;
        Ok(SyncResult {
            fetched: fetched.trim().to_string(),
            status,
        })
    }

    /// Local and remote branches merged into one listing. Remote heads not
    /// yet tracked locally are discovered via `ls-remote` and added when
    /// absent; network failure there degrades to the tracked listing.
    pub fn branches(&self) -> GitResult<BranchList> {
        self.ensure_repository()?;

        let local_output = self.git("branches", &["branch", "-v"])?;
        let (local, current) = parser::parse_local_branches(&local_output);

        let mut remote = match self.git_optional("branches", &["branch", "-r", "-v"])? {
            Some(output) => parser::parse_remote_branches(&output),
            None => Vec::new(),
        };

        match self.git_optional("branches", &["ls-remote", "--heads", "origin"]) {
            Ok(Some(output)) => {
                let heads = parser::parse_remote_heads(&output, "origin");
                remote = parser::supplement_remote_branches(remote, heads);
            }
            Ok(None) => warn!("could not list remote heads; returning tracked branches only"),
            Err(err) => warn!(error = %err, "could not list remote heads"),
        }

        Ok(BranchList {
            local,
            remote,
            current,
        })
    }

    /// Decorated commit graph across all refs, newest first, bounded by
    /// `limit` (default 50 when unset or non-positive).
    pub fn branch_graph(&self, limit: Option<usize>) -> GitResult<BranchGraph> {
        self.ensure_repository()?;

        let effective = match limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_GRAPH_LIMIT,
        };
        let count = format!("-{}", effective);
        let args = [
            "log",
            "--oneline",
            "--graph",
            "--all",
            "--decorate",
            "--format=%H|%h|%an|%ae|%ad|%s|%D",
            "--date=iso",
            &count,
        ];

        // A history-less repository makes git log exit non-zero; that is an
        // empty graph, not a failure.
        let output = self
            .git_optional("branch graph", &args)?
            .unwrap_or_default();

        let commits = parser::parse_log_graph(&output);
        let total = commits.len();
        Ok(BranchGraph { commits, total })
    }

    /// Create a branch off `from` and switch to it.
    pub fn create_branch(&self, name: &str, from: &str) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        let output = self.git("create branch", &["checkout", "-b", name, from])?;
        info!(branch = name, from, "created branch");
        Ok(OperationOutcome::done(
            format!("created and switched to branch {}", name),
            output.trim(),
        ))
    }

    /// Switch to an existing branch.
    pub fn switch_branch(&self, name: &str) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        let output = self.git("switch branch", &["checkout", name])?;
        Ok(OperationOutcome::done(
            format!("switched to branch {}", name),
            output.trim(),
        ))
    }

    /// Merge `source` into `target`: the target is checked out first, then
    /// the source is merged into it.
    pub fn merge_branch(
        &self,
        source: &str,
        target: &str,
        identity: &CommitIdentity,
    ) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        self.ensure_identity(identity)?;

        self.git("merge", &["checkout", target])?;
        let output = self.git("merge", &["merge", source])?;
        info!(source, target, "merged branch");
        Ok(OperationOutcome::done(
            format!("merged {} into {}", source, target),
            output.trim(),
        ))
    }

    /// Stash the working tree including untracked content. A clean tree is
    /// a no-op reported with `success = false`, not an error.
    pub fn stash(
        &self,
        message: Option<&str>,
        identity: &CommitIdentity,
    ) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;
        self.ensure_identity(identity)?;

        let status = self.git("stash", &["status", "--porcelain"])?;
        if status.trim().is_empty() {
            return Ok(OperationOutcome::nothing_to_do(
                "no changes to stash",
                "working tree is clean",
            ));
        }

        let output = match message {
            Some(msg) if !msg.trim().is_empty() => {
                self.git("stash", &["stash", "push", "-a", "-m", msg])?
            }
            _ => self.git("stash", &["stash", "push", "-a"])?,
        };
        Ok(OperationOutcome::done("changes stashed", output.trim()))
    }

    /// Apply and drop the newest stash entry. An empty stash is a no-op
    /// reported with `success = false`.
    pub fn stash_pop(&self) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;

        let list = self.git("stash pop", &["stash", "list"])?;
        if list.trim().is_empty() {
            return Ok(OperationOutcome::nothing_to_do(
                "no stash found",
                "there are no stashed changes to apply",
            ));
        }

        let output = self.git("stash pop", &["stash", "pop"])?;
        Ok(OperationOutcome::done("stash applied", output.trim()))
    }

    /// Stash presence and entry count.
    pub fn stash_state(&self) -> GitResult<StashState> {
        self.ensure_repository()?;
        let output = self.git("stash list", &["stash", "list"])?;
        Ok(parser::parse_stash_list(&output))
    }

    /// Soft reset unstages; hard reset additionally discards the working
    /// tree and removes untracked files and directories.
    pub fn reset(&self, hard: bool) -> GitResult<OperationOutcome> {
        self.ensure_repository()?;

        if hard {
            self.git("reset", &["reset", "--hard", "HEAD"])?;
            let cleaned = self.git("reset", &["clean", "-fd"])?;
            Ok(OperationOutcome::done("hard reset complete", cleaned.trim()))
        } else {
            let output = self.git("reset", &["reset", "HEAD"])?;
            Ok(OperationOutcome::done("soft reset complete", output.trim()))
        }
    }

    /// Create a tag (annotated when a message is given) and return the
    /// refreshed repository info.
    pub fn create_tag(
        &self,
        name: &str,
        message: Option<&str>,
        fallback_name: &str,
    ) -> GitResult<RepositoryInfo> {
        self.ensure_repository()?;

        match message {
            Some(msg) if !msg.trim().is_empty() => {
                self.git("tag", &["tag", "-a", name, "-m", msg])?;
            }
            _ => {
                self.git("tag", &["tag", name])?;
            }
        }
        info!(tag = name, "created tag");

        self.repository_info(fallback_name)
    }

    /// Configure a commit identity when the workspace has none; an unset
    /// email is synthesized from the user name.
    fn ensure_identity(&self, identity: &CommitIdentity) -> GitResult<()> {
        let name = self
            .git_optional("configure identity", &["config", "user.name"])?
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            self.git("configure identity", &["config", "user.name", &identity.name])?;
            debug!(name = %identity.name, "configured git user.name");
        }

        let email = self
            .git_optional("configure identity", &["config", "user.email"])?
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if email.is_empty() {
            let effective = identity.effective_email();
            self.git("configure identity", &["config", "user.email", &effective])?;
            debug!(email = %effective, "configured git user.email");
        }

        Ok(())
    }

    /// Remote argument for a network operation: the authenticated URL when
    /// a token is supplied and the stored URL is eligible, the configured
    /// remote name otherwise. The token itself is never logged.
    fn remote_target(&self, token: Option<&str>) -> GitResult<String> {
        if let Some(token) = token {
            let url = self
                .git_optional("resolve remote", &["config", "--get", "remote.origin.url"])?
                .unwrap_or_default();
            if let Some(auth) = authenticated_url(&url, token) {
                return Ok(auth);
            }
            debug!("remote url not eligible for credential injection; using configured remote");
        }
        Ok("origin".to_string())
    }
}

/// Clone a repository into a fresh workspace directory.
///
/// The destination must not already exist as a populated directory; its
/// parent is created as needed. With a token, the clone runs against the
/// authenticated URL; the full command line is never logged.
pub fn clone_repository(
    url: &str,
    branch: &str,
    dest: &Path,
    token: Option<&str>,
) -> GitResult<()> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| GitError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let target = match token.and_then(|t| authenticated_url(url, t)) {
        Some(auth) => auth,
        None => normalize_remote_url(url),
    };

    let dir_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());

    info!(url = %normalize_remote_url(url), branch, "cloning repository");
    run_command(
        "git",
        &[
            "clone",
            "--branch",
            branch,
            "--single-branch",
            &target,
            &dir_name,
        ],
        parent,
        &[("GIT_TERMINAL_PROMPT", "0")],
    )
    .map_err(|err| wrap("clone", err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_workspace_is_precondition_failure() {
        let repo = WorkspaceRepository::new("/definitely/not/a/workspace");
        assert!(matches!(
            repo.status(),
            Err(GitError::WorkspaceMissing { .. })
        ));
        assert!(matches!(
            repo.branches(),
            Err(GitError::WorkspaceMissing { .. })
        ));
    }

    #[test]
    fn test_workspace_without_metadata_is_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let repo = WorkspaceRepository::new(dir.path());
        let identity = CommitIdentity::new("tester");

        assert!(matches!(
            repo.status(),
            Err(GitError::MetadataMissing { .. })
        ));
        assert!(matches!(
            repo.repository_info("proj"),
            Err(GitError::MetadataMissing { .. })
        ));
        assert!(matches!(
            repo.commit("msg", &[], &identity),
            Err(GitError::MetadataMissing { .. })
        ));
        assert!(matches!(
            repo.branch_graph(None),
            Err(GitError::MetadataMissing { .. })
        ));
        assert!(matches!(
            repo.stash(None, &identity),
            Err(GitError::MetadataMissing { .. })
        ));
        assert!(matches!(repo.reset(true), Err(GitError::MetadataMissing { .. })));
    }

    #[test]
    fn test_push_without_token_is_credential_missing() {
        // The credential check happens before any network traffic; a
        // metadata-less dir still reports the precondition first, so use a
        // real-looking repo layout.
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let repo = WorkspaceRepository::new(dir.path());

        assert!(matches!(
            repo.push("main", None),
            Err(GitError::CredentialMissing)
        ));
    }
}
