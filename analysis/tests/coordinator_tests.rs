//! Coordinator tests against recording doubles.
//!
//! These verify the aggregation contract: partial tool failure never
//! aborts the pipeline, every provisioned sandbox is torn down exactly
//! once, and progress notifications bracket the run.

use analysis::{
    AnalysisCoordinator, AnalysisError, AnalysisRequest, AnalysisStatus, Analyzer, Category,
    CodeProblem, ContainerClient, ContainerError, ContainerHandle, ContainerResult, ExecOutput,
    ProblemStore, ProgressNotifier, Severity, StoreError,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingClient {
    events: Mutex<Vec<String>>,
    exec_delay: Option<Duration>,
}

impl RecordingClient {
    fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.as_str() == event)
            .count()
    }
}

impl ContainerClient for RecordingClient {
    fn provision(&self, owner: &str, project: &str) -> ContainerResult<ContainerHandle> {
        self.events.lock().unwrap().push("provision".to_string());
        Ok(ContainerHandle {
            name: format!("atelier-analysis-{}-{}", owner, project),
            volume: format!("workspace-{}-{}", owner, project),
        })
    }

    fn copy_in(&self, _: &ContainerHandle, _: &Path, _: &str) -> ContainerResult<()> {
        Ok(())
    }

    fn copy_out(&self, _: &ContainerHandle, _: &str, _: &Path) -> ContainerResult<()> {
        Ok(())
    }

    fn exec(&self, handle: &ContainerHandle, argv: &[String]) -> ContainerResult<ExecOutput> {
        if let Some(delay) = self.exec_delay {
            std::thread::sleep(delay);
        }
        if argv.first().map(String::as_str) == Some("fail") {
            return Err(ContainerError::ExecFailed {
                name: handle.name.clone(),
                reason: "tool crashed".to_string(),
            });
        }
        Ok(ExecOutput {
            stdout: "FINDING first\nFINDING second\nnoise\n".to_string(),
            stderr: String::new(),
            status: 0,
        })
    }

    fn logs(&self, _: &ContainerHandle) -> ContainerResult<String> {
        Ok(String::new())
    }

    fn teardown(&self, _: &ContainerHandle) -> ContainerResult<()> {
        self.events.lock().unwrap().push("teardown".to_string());
        Ok(())
    }
}

struct StubAnalyzer {
    name: &'static str,
    fail: bool,
}

impl Analyzer for StubAnalyzer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn prepare(&self) -> Vec<Vec<String>> {
        Vec::new()
    }

    fn invoke(&self) -> Vec<String> {
        if self.fail {
            vec!["fail".to_string()]
        } else {
            vec!["scan".to_string()]
        }
    }

    fn parse(&self, output: &str) -> Vec<CodeProblem> {
        output
            .lines()
            .filter(|l| l.starts_with("FINDING"))
            .map(|l| CodeProblem::new(self.name, l, Severity::Warning, Category::CodeSmell))
            .collect()
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(String, AnalysisStatus, String)>>,
}

#[async_trait]
impl ProgressNotifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, status: AnalysisStatus, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push((recipient.to_string(), status, message.to_string()));
    }
}

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Vec<CodeProblem>>,
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn save(&self, _: &str, _: &str, problems: &[CodeProblem]) -> Result<(), StoreError> {
        self.saved.lock().unwrap().extend_from_slice(problems);
        Ok(())
    }
}

fn coordinator_with_stubs(
    client: Arc<RecordingClient>,
    failing_index: Option<usize>,
    timeout: Duration,
) -> AnalysisCoordinator {
    let names: [&'static str; 4] = ["tool-1", "tool-2", "tool-3", "tool-4"];
    let mut coordinator = AnalysisCoordinator::new(client, timeout);
    for (i, name) in names.into_iter().enumerate() {
        coordinator.register(Arc::new(StubAnalyzer {
            name,
            fail: failing_index == Some(i),
        }));
    }
    coordinator
}

fn request(source: &Path) -> AnalysisRequest {
    AnalysisRequest {
        owner: "7".to_string(),
        project: "widget".to_string(),
        source_path: source.to_path_buf(),
    }
}

#[tokio::test]
async fn test_failed_adapter_is_skipped_not_fatal() {
    let source = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient::default());
    let coordinator = coordinator_with_stubs(Arc::clone(&client), Some(2), Duration::from_secs(30));
    let notifier = RecordingNotifier::default();

    let report = coordinator
        .analyze(&request(source.path()), &notifier)
        .await
        .unwrap();

    // three healthy adapters, two findings each
    assert_eq!(report.problems.len(), 6);
    assert_eq!(report.skipped, vec!["tool-3".to_string()]);
    let tools: Vec<&str> = report.problems.iter().map(|p| p.tool.as_str()).collect();
    assert!(tools.contains(&"tool-1"));
    assert!(tools.contains(&"tool-2"));
    assert!(tools.contains(&"tool-4"));
    assert!(!tools.contains(&"tool-3"));
}

#[tokio::test]
async fn test_every_provision_is_torn_down_exactly_once() {
    let source = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient::default());
    let coordinator = coordinator_with_stubs(Arc::clone(&client), Some(2), Duration::from_secs(30));
    let notifier = RecordingNotifier::default();

    coordinator
        .analyze(&request(source.path()), &notifier)
        .await
        .unwrap();

    assert_eq!(client.count("provision"), 4);
    assert_eq!(client.count("teardown"), 4);
}

#[tokio::test]
async fn test_notifications_bracket_the_run() {
    let source = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient::default());
    let coordinator = coordinator_with_stubs(client, None, Duration::from_secs(30));
    let notifier = RecordingNotifier::default();

    coordinator
        .analyze(&request(source.path()), &notifier)
        .await
        .unwrap();

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].1, AnalysisStatus::Started);
    assert_eq!(events[0].0, "7");
    assert_eq!(events[1].1, AnalysisStatus::Completed);
    assert!(events[1].2.contains("8 problems"));
    assert!(events[1].2.contains("0 tools skipped"));
}

#[tokio::test]
async fn test_missing_source_is_pipeline_failure() {
    let client = Arc::new(RecordingClient::default());
    let coordinator = coordinator_with_stubs(Arc::clone(&client), None, Duration::from_secs(30));
    let notifier = RecordingNotifier::default();

    let result = coordinator
        .analyze(&request(Path::new("/definitely/not/a/source/tree")), &notifier)
        .await;

    assert!(matches!(result, Err(AnalysisError::SourceMissing { .. })));
    assert_eq!(client.count("provision"), 0);

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1, AnalysisStatus::Error);
}

#[tokio::test]
async fn test_hung_adapter_is_bounded_by_timeout() {
    let source = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient {
        events: Mutex::new(Vec::new()),
        exec_delay: Some(Duration::from_millis(500)),
    });
    let mut coordinator = AnalysisCoordinator::new(
        Arc::clone(&client) as Arc<dyn ContainerClient>,
        Duration::from_millis(50),
    );
    coordinator.register(Arc::new(StubAnalyzer {
        name: "slow-tool",
        fail: false,
    }));
    let notifier = RecordingNotifier::default();

    let report = coordinator
        .analyze(&request(source.path()), &notifier)
        .await
        .unwrap();

    assert!(report.problems.is_empty());
    assert_eq!(report.skipped, vec!["slow-tool".to_string()]);
}

#[tokio::test]
async fn test_problem_store_receives_aggregate() {
    let source = tempfile::tempdir().unwrap();
    let client = Arc::new(RecordingClient::default());
    let coordinator = coordinator_with_stubs(client, None, Duration::from_secs(30));
    let notifier = RecordingNotifier::default();
    let store = MemoryStore::default();

    let report = coordinator
        .analyze(&request(source.path()), &notifier)
        .await
        .unwrap();
    store
        .save("7", "widget", &report.problems)
        .await
        .unwrap();

    assert_eq!(store.saved.lock().unwrap().len(), report.problems.len());
}
