//! Workspace version-control orchestration.
//!
//! Drives the `git` binary as an external process against a per-user
//! workspace directory and turns its textual output into structured state.
//! Layered leaves-first: a generic command executor, pure output parsers,
//! and a repository driver that combines the two and injects short-lived
//! authenticated remote URLs for network operations.

pub mod auth;
pub mod command;
pub mod driver;
pub mod hosting;
pub mod parser;
pub mod types;

pub use auth::{authenticated_url, normalize_remote_url};
pub use command::{run_command, CommandError, CommandOutput, CommandResult};
pub use driver::{clone_repository, GitError, GitResult, WorkspaceRepository};
pub use hosting::{HostedBranch, HostedRepository, HostingClient, HostingError, HostingResult};
pub use types::{
    BranchGraph, BranchInfo, BranchList, CommitGraphNode, CommitIdentity, CommitInfo, FileStatus,
    FileStatusEntry, OperationOutcome, RepositoryInfo, StashState, SyncResult, WorkspaceStatus,
};
