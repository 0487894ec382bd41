//! Analysis coordinator.
//!
//! Fans out every registered analyzer adapter onto its own blocking task,
//! each in its own sandbox, bounded by the configured per-tool timeout.
//! One adapter's failure is caught, logged and excluded from the result;
//! only a pipeline-level setup failure aborts the whole call. Progress is
//! reported to an external notification sink at start, after aggregation,
//! and on unrecoverable failure.

use crate::adapter::{run_analyzer, Analyzer, ToolError};
use crate::adapters::{CheckstyleAdapter, PmdAdapter, SonarScannerAdapter, SpotBugsAdapter};
use crate::container::ContainerClient;
use crate::problem::CodeProblem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task;
use tokio::time::timeout;
use tracing::{error, info};

/// Pipeline progress states reported to the notification sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Started,
    Completed,
    Error,
}

/// External notification sink (websocket, log, test double)
#[async_trait]
pub trait ProgressNotifier: Send + Sync {
    async fn notify(&self, recipient: &str, status: AnalysisStatus, message: &str);
}

/// Durable-store failure
#[derive(Error, Debug)]
#[error("problem store failed: {0}")]
pub struct StoreError(pub String);

/// Durable problem store; the coordinator returns the aggregated list and
/// the caller persists it through this seam.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn save(
        &self,
        owner: &str,
        project: &str,
        problems: &[CodeProblem],
    ) -> Result<(), StoreError>;
}

/// Pipeline-level failures; per-adapter failures never surface here
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("project source tree not found: {}", path.display())]
    SourceMissing { path: PathBuf },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// One analysis run over a project's source tree
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub owner: String,
    pub project: String,
    pub source_path: PathBuf,
}

/// Aggregated outcome of one pipeline run
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub problems: Vec<CodeProblem>,
    /// Names of adapters whose runs failed or timed out
    pub skipped: Vec<String>,
    pub duration: Duration,
}

enum AdapterOutcome {
    Finished(Result<Vec<CodeProblem>, ToolError>),
    TimedOut,
}

pub struct AnalysisCoordinator {
    client: Arc<dyn ContainerClient>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    tool_timeout: Duration,
}

impl AnalysisCoordinator {
    pub fn new(client: Arc<dyn ContainerClient>, tool_timeout: Duration) -> Self {
        Self {
            client,
            analyzers: Vec::new(),
            tool_timeout,
        }
    }

    /// Coordinator pre-loaded with the standard tool set.
    pub fn with_default_analyzers(client: Arc<dyn ContainerClient>, tool_timeout: Duration) -> Self {
        let mut coordinator = Self::new(client, tool_timeout);
        coordinator.register(Arc::new(SonarScannerAdapter::new()));
        coordinator.register(Arc::new(PmdAdapter::new()));
        coordinator.register(Arc::new(CheckstyleAdapter::new()));
        coordinator.register(Arc::new(SpotBugsAdapter::new()));
        coordinator
    }

    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    /// Run every adapter concurrently, each in its own sandbox, and
    /// aggregate whatever succeeded.
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        notifier: &dyn ProgressNotifier,
    ) -> AnalysisResult<AnalysisReport> {
        if !request.source_path.exists() {
            let err = AnalysisError::SourceMissing {
                path: request.source_path.clone(),
            };
            notifier
                .notify(
                    &request.owner,
                    AnalysisStatus::Error,
                    &format!("analysis failed: {}", err),
                )
                .await;
            return Err(err);
        }

        notifier
            .notify(
                &request.owner,
                AnalysisStatus::Started,
                &format!("analysis started for {}", request.project),
            )
            .await;

        let started = Instant::now();
        let mut tasks = Vec::with_capacity(self.analyzers.len());

        for analyzer in &self.analyzers {
            let client = Arc::clone(&self.client);
            let analyzer = Arc::clone(analyzer);
            let owner = request.owner.clone();
            let project = request.project.clone();
            let source = request.source_path.clone();
            let bound = self.tool_timeout;
            let name = analyzer.name();

            let handle = tokio::spawn(async move {
                let work = task::spawn_blocking(move || {
                    run_analyzer(client.as_ref(), &owner, &project, &source, analyzer.as_ref())
                });
                match timeout(bound, work).await {
                    Ok(Ok(result)) => AdapterOutcome::Finished(result),
                    Ok(Err(join_err)) => AdapterOutcome::Finished(Err(ToolError::Invoke {
                        tool: name.to_string(),
                        reason: format!("adapter task failed: {}", join_err),
                    })),
                    // the blocking task keeps running and still tears down
                    // its own container when the tool finally exits
                    Err(_) => AdapterOutcome::TimedOut,
                }
            });
            tasks.push((name, handle));
        }

        let mut problems = Vec::new();
        let mut skipped = Vec::new();

        for (name, handle) in tasks {
            match handle.await {
                Ok(AdapterOutcome::Finished(Ok(found))) => {
                    info!(tool = name, count = found.len(), "adapter finished");
                    problems.extend(found);
                }
                Ok(AdapterOutcome::Finished(Err(err))) => {
                    error!(tool = name, error = %err, "adapter failed; skipping its results");
                    skipped.push(name.to_string());
                }
                Ok(AdapterOutcome::TimedOut) => {
                    error!(tool = name, "adapter timed out; skipping its results");
                    skipped.push(name.to_string());
                }
                Err(join_err) => {
                    error!(tool = name, error = %join_err, "adapter task lost");
                    skipped.push(name.to_string());
                }
            }
        }

        let report = AnalysisReport {
            problems,
            skipped,
            duration: started.elapsed(),
        };

        notifier
            .notify(
                &request.owner,
                AnalysisStatus::Completed,
                &format!(
                    "analysis completed for {}: {} problems, {} tools skipped",
                    request.project,
                    report.problems.len(),
                    report.skipped.len()
                ),
            )
            .await;

        Ok(report)
    }
}
