//! Thin collaborator implementations for the analysis pipeline: a
//! tracing-backed notification sink and a JSON-file problem store.

use analysis::{AnalysisStatus, CodeProblem, ProblemStore, ProgressNotifier, StoreError};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{error, info};

/// Notification sink that reports progress through the log.
pub struct LogNotifier;

#[async_trait]
impl ProgressNotifier for LogNotifier {
    async fn notify(&self, recipient: &str, status: AnalysisStatus, message: &str) {
        match status {
            AnalysisStatus::Error => error!(recipient, ?status, "{}", message),
            _ => info!(recipient, ?status, "{}", message),
        }
    }
}

/// Problem store that writes the aggregated list to one JSON file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProblemStore for JsonFileStore {
    async fn save(
        &self,
        owner: &str,
        project: &str,
        problems: &[CodeProblem],
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(problems)
            .map_err(|e| StoreError(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        info!(
            owner,
            project,
            path = %self.path.display(),
            count = problems.len(),
            "saved problem report"
        );
        Ok(())
    }
}
