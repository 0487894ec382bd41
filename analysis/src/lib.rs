//! Containerized static-analysis pipeline.
//!
//! Provisions ephemeral, resource-bounded sandboxes, runs independent
//! analysis tools against a project's source tree, and aggregates their
//! heterogeneous outputs into a uniform problem model while tolerating
//! partial tool failure.

pub mod adapter;
pub mod adapters;
pub mod container;
pub mod coordinator;
pub mod problem;

pub use adapter::{run_analyzer, Analyzer, ToolError, ToolResult, WORKSPACE_MOUNT};
pub use adapters::{CheckstyleAdapter, PmdAdapter, SonarScannerAdapter, SpotBugsAdapter};
pub use container::{
    container_name, detect_runtime, volume_name, CliContainerClient, ContainerClient,
    ContainerError, ContainerHandle, ContainerResult, ContainerRuntime, ExecOutput, SandboxConfig,
};
pub use coordinator::{
    AnalysisCoordinator, AnalysisError, AnalysisReport, AnalysisRequest, AnalysisResult,
    AnalysisStatus, ProblemStore, ProgressNotifier, StoreError,
};
pub use problem::{Category, CodeProblem, Severity};
