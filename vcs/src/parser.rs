//! Pure parsers for git's textual output.
//!
//! Every function here maps raw command output to structured records and
//! nothing else: no subprocess calls, no filesystem access. Malformed lines
//! are skipped rather than failing the whole parse, and parsing the same
//! input twice yields identical results.

use crate::types::{
    BranchInfo, CommitGraphNode, CommitInfo, FileStatus, FileStatusEntry, StashState,
    WorkspaceStatus,
};

/// Parse `git status --porcelain` output.
pub fn parse_status(output: &str) -> WorkspaceStatus {
    let mut files = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() || line.len() < 4 {
            continue;
        }

        let code = &line[..2];
        let path = line[3..].to_string();
        files.push(FileStatusEntry {
            path,
            status: FileStatus::from_code(code),
        });
    }

    WorkspaceStatus::new(files)
}

/// Parse `git branch -v` output into branch records plus the current branch.
pub fn parse_local_branches(output: &str) -> (Vec<BranchInfo>, String) {
    let mut branches = Vec::new();
    let mut current = String::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (is_current, rest) = match line.strip_prefix("* ") {
            Some(rest) => (true, rest),
            None => (false, line),
        };

        // columns are alignment-padded; whitespace runs collapse
        let mut parts = rest.split_whitespace();
        let name = match parts.next() {
            Some(name) => name,
            None => continue,
        };
        let commit = match parts.next() {
            Some(commit) => commit,
            None => continue,
        };
        let summary = parts.collect::<Vec<_>>().join(" ");

        if is_current {
            current = name.to_string();
        }

        branches.push(BranchInfo {
            name: name.to_string(),
            commit: commit.to_string(),
            summary,
            is_current,
            is_remote: false,
        });
    }

    (branches, current)
}

/// Parse `git branch -r -v` output. Symbolic alias lines (`HEAD -> ...`)
/// are skipped.
pub fn parse_remote_branches(output: &str) -> Vec<BranchInfo> {
    let mut branches = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.contains("->") {
            continue;
        }

        let mut parts = line.split_whitespace();
        let name = match parts.next() {
            Some(name) => name,
            None => continue,
        };
        let commit = match parts.next() {
            Some(commit) => commit,
            None => continue,
        };
        let summary = parts.collect::<Vec<_>>().join(" ");

        branches.push(BranchInfo {
            name: name.to_string(),
            commit: commit.to_string(),
            summary,
            is_current: false,
            is_remote: true,
        });
    }

    branches
}

/// Parse `git ls-remote --heads <remote>` output. Branch names are
/// prefixed with the remote name so they line up with `branch -r` output.
pub fn parse_remote_heads(output: &str, remote: &str) -> Vec<BranchInfo> {
    let mut branches = Vec::new();

    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (hash, reference) = match (parts.next(), parts.next()) {
            (Some(hash), Some(reference)) => (hash, reference),
            _ => continue,
        };

        let Some(branch) = reference.strip_prefix("refs/heads/") else {
            continue;
        };

        let short: String = hash.chars().take(7).collect();
        branches.push(BranchInfo {
            name: format!("{}/{}", remote, branch),
            commit: short,
            summary: "remote branch".to_string(),
            is_current: false,
            is_remote: true,
        });
    }

    branches
}

/// Supplement tracked remote branches with heads discovered directly on the
/// remote, deduplicated by name: an ls-remote entry is added only when the
/// tracking listing does not already contain it.
pub fn supplement_remote_branches(
    mut tracked: Vec<BranchInfo>,
    heads: Vec<BranchInfo>,
) -> Vec<BranchInfo> {
    for head in heads {
        if !tracked.iter().any(|b| b.name == head.name) {
            tracked.push(head);
        }
    }
    tracked
}

/// Parse `git log --graph --format=%H|%h|%an|%ae|%ad|%s|%D` output.
///
/// The graph prefix runs up to the first alphanumeric character of a line;
/// lines with fewer than six fields after it are skipped.
pub fn parse_log_graph(output: &str) -> Vec<CommitGraphNode> {
    let mut commits = Vec::new();

    for line in output.lines() {
        if !line.contains('|') {
            continue;
        }

        let Some(data_start) = line.find(|c: char| c.is_alphanumeric()) else {
            continue;
        };

        let graph = line[..data_start].to_string();
        let parts: Vec<&str> = line[data_start..].split('|').collect();
        if parts.len() < 6 {
            continue;
        }

        commits.push(CommitGraphNode {
            hash: parts[0].to_string(),
            short_hash: parts[1].to_string(),
            author: parts[2].to_string(),
            email: parts[3].to_string(),
            date: parts[4].to_string(),
            subject: parts[5].to_string(),
            refs: parts.get(6).unwrap_or(&"").trim().to_string(),
            graph,
        });
    }

    commits
}

/// Parse `git log -1 --pretty=format:%H|%s|%an|%ad` output.
pub fn parse_last_commit(output: &str) -> Option<CommitInfo> {
    let line = output.trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split('|').collect();
    Some(CommitInfo {
        hash: parts[0].to_string(),
        message: parts.get(1).unwrap_or(&"").to_string(),
        author: parts.get(2).unwrap_or(&"").to_string(),
        date: parts.get(3).unwrap_or(&"").to_string(),
    })
}

/// Derive a stash summary from `git stash list` output.
pub fn parse_stash_list(output: &str) -> StashState {
    let count = output.lines().filter(|l| !l.trim().is_empty()).count();
    StashState {
        present: count > 0,
        count,
    }
}

/// Display name for a repository: last path segment of the remote URL with
/// any `.git` suffix stripped, falling back to the project's own name when
/// the URL has no path separator.
pub fn repository_display_name(remote_url: &str, fallback: &str) -> String {
    let url = remote_url.trim();
    match url.rsplit('/').next() {
        Some(segment) if url.contains('/') && !segment.is_empty() => {
            segment.trim_end_matches(".git").to_string()
        }
        _ => fallback.to_string(),
    }
}
