mod config;
mod layout;
mod sinks;

use analysis::{AnalysisCoordinator, AnalysisRequest, CliContainerClient, ProblemStore};
use clap::{Parser, Subcommand};
use config::AtelierConfig;
use layout::WorkspaceLayout;
use sinks::{JsonFileStore, LogNotifier};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vcs::{clone_repository, CommitIdentity, HostingClient, WorkspaceRepository};

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Workspace git orchestration and containerized static analysis")]
struct Cli {
    /// Path to the configuration file (default: ./atelier.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Owner identity the workspaces belong to
    #[arg(long, global = true, default_value = "local")]
    owner: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Working-tree status of a project workspace
    Status { project: String },
    /// Repository metadata: remote, branch, last commit
    Info { project: String },
    /// Stage files (or everything) and commit
    Commit {
        project: String,
        /// Commit message
        #[arg(short, long)]
        message: String,
        /// Specific files to stage; everything when omitted
        files: Vec<String>,
    },
    /// Push a branch to the remote (requires a stored token)
    Push {
        project: String,
        #[arg(long, default_value = "main")]
        branch: String,
    },
    /// Pull a branch from the remote
    Pull {
        project: String,
        #[arg(long, default_value = "main")]
        branch: String,
    },
    /// Fetch the remote and report status
    Sync { project: String },
    /// Local and remote branches, merged and deduplicated
    Branches { project: String },
    /// Decorated commit graph across all refs
    Graph {
        project: String,
        /// Maximum commits to return (default 50)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Create a branch and switch to it
    CreateBranch {
        project: String,
        name: String,
        #[arg(long, default_value = "main")]
        from: String,
    },
    /// Switch to an existing branch
    Switch { project: String, name: String },
    /// Merge a source branch into a target branch
    Merge {
        project: String,
        source: String,
        #[arg(long, default_value = "main")]
        target: String,
    },
    /// Stash the working tree including untracked files
    Stash {
        project: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Apply and drop the newest stash entry
    StashPop { project: String },
    /// Unstage everything; --hard also discards the working tree
    Reset {
        project: String,
        #[arg(long)]
        hard: bool,
    },
    /// Create a tag (annotated when a message is given)
    Tag {
        project: String,
        name: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Clone a repository into a new project workspace
    Clone {
        /// Repository URL
        url: String,
        /// Project name for the new workspace
        project: String,
        #[arg(long, default_value = "main")]
        branch: String,
    },
    /// Store the remote hosting token for this owner
    SetToken { token: String },
    /// List a repository's branches via the hosting API
    HostingBranches { repo_owner: String, repo_name: String },
    /// Run all analyzers against a project workspace
    Analyze {
        project: String,
        /// Write the aggregated problem list to this JSON file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AtelierConfig::load(cli.config.as_deref())?;
    let layout = WorkspaceLayout::new(config.workspace.base_path.clone());
    let owner = cli.owner.clone();
    let identity = CommitIdentity::new(owner.clone());

    let repo = |project: &str| WorkspaceRepository::new(layout.project_dir(&owner, project));

    match cli.command {
        Commands::Status { project } => {
            let status = repo(&project).status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Info { project } => {
            let info = repo(&project).repository_info(&project)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Commit {
            project,
            message,
            files,
        } => {
            let outcome = repo(&project).commit(&message, &files, &identity)?;
            println!("{}", outcome.message);
        }
        Commands::Push { project, branch } => {
            let token = layout.credential(&owner);
            let outcome = repo(&project).push(&branch, token.as_deref())?;
            println!("{}", outcome.message);
        }
        Commands::Pull { project, branch } => {
            let token = layout.credential(&owner);
            let outcome = repo(&project).pull(&branch, token.as_deref())?;
            println!("{}", outcome.message);
        }
        Commands::Sync { project } => {
            let token = layout.credential(&owner);
            let result = repo(&project).sync(token.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Branches { project } => {
            let branches = repo(&project).branches()?;
            println!("{}", serde_json::to_string_pretty(&branches)?);
        }
        Commands::Graph { project, limit } => {
            let graph = repo(&project).branch_graph(limit)?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
        Commands::CreateBranch {
            project,
            name,
            from,
        } => {
            let outcome = repo(&project).create_branch(&name, &from)?;
            println!("{}", outcome.message);
        }
        Commands::Switch { project, name } => {
            let outcome = repo(&project).switch_branch(&name)?;
            println!("{}", outcome.message);
        }
        Commands::Merge {
            project,
            source,
            target,
        } => {
            let outcome = repo(&project).merge_branch(&source, &target, &identity)?;
            println!("{}", outcome.message);
        }
        Commands::Stash { project, message } => {
            let outcome = repo(&project).stash(message.as_deref(), &identity)?;
            println!("{}", outcome.message);
        }
        Commands::StashPop { project } => {
            let outcome = repo(&project).stash_pop()?;
            println!("{}", outcome.message);
        }
        Commands::Reset { project, hard } => {
            let outcome = repo(&project).reset(hard)?;
            println!("{}", outcome.message);
        }
        Commands::Tag {
            project,
            name,
            message,
        } => {
            let info = repo(&project).create_tag(&name, message.as_deref(), &project)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Clone {
            url,
            project,
            branch,
        } => {
            let dest = layout.project_dir(&owner, &project);
            let token = layout.credential(&owner);
            clone_repository(&url, &branch, &dest, token.as_deref())?;
            println!("cloned {} into {}", project, dest.display());
        }
        Commands::SetToken { token } => {
            let path = layout.store_credential(&owner, &token)?;
            println!("stored token at {}", path.display());
        }
        Commands::HostingBranches {
            repo_owner,
            repo_name,
        } => {
            let token = layout
                .credential(&owner)
                .ok_or("no hosting token stored; run `atelier set-token` first")?;
            let client = HostingClient::new(config.hosting.api_base.clone())?;
            let branches = client
                .list_branches(&repo_owner, &repo_name, &token)
                .await?;
            for branch in branches {
                println!(
                    "{}  {}{}",
                    branch.sha,
                    branch.name,
                    if branch.protected { "  [protected]" } else { "" }
                );
            }
        }
        Commands::Analyze { project, out } => {
            let source = layout.project_dir(&owner, &project);
            let sandbox = config.sandbox_config();
            let timeout = sandbox.tool_timeout;
            let client = Arc::new(CliContainerClient::new(sandbox)?);
            let coordinator = AnalysisCoordinator::with_default_analyzers(client, timeout);

            let request = AnalysisRequest {
                owner: owner.clone(),
                project: project.clone(),
                source_path: source,
            };
            let report = coordinator.analyze(&request, &LogNotifier).await?;

            info!(
                problems = report.problems.len(),
                skipped = report.skipped.len(),
                "analysis finished"
            );
            if let Some(out) = out {
                JsonFileStore::new(&out)
                    .save(&owner, &project, &report.problems)
                    .await?;
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
