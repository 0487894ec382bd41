//! SonarScanner adapter.
//!
//! Downloads the scanner CLI into the sandbox, runs it against the
//! workspace, and lifts issue lines out of the console output. Scanner
//! console output is log-shaped rather than a stable report format, so the
//! parse is deliberately permissive: any log line mentioning an issue
//! becomes a problem, everything else is skipped.

use crate::adapter::{Analyzer, WORKSPACE_MOUNT};
use crate::problem::{Category, CodeProblem, Severity};

const SCANNER_VERSION: &str = "4.7.0.2747";

pub struct SonarScannerAdapter {
    project_key: String,
    host_url: String,
}

impl SonarScannerAdapter {
    pub fn new() -> Self {
        Self {
            project_key: "workspace".to_string(),
            host_url: "http://localhost:9000".to_string(),
        }
    }

    pub fn with_project_key(mut self, key: impl Into<String>) -> Self {
        self.project_key = key.into();
        self
    }

    pub fn with_host_url(mut self, url: impl Into<String>) -> Self {
        self.host_url = url.into();
        self
    }
}

impl Default for SonarScannerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for SonarScannerAdapter {
    fn name(&self) -> &'static str {
        "sonarqube"
    }

    fn prepare(&self) -> Vec<Vec<String>> {
        let archive = format!("sonar-scanner-cli-{}-linux.zip", SCANNER_VERSION);
        vec![
            vec!["apt-get".into(), "update".into()],
            vec!["apt-get".into(), "install".into(), "-y".into(), "wget".into(), "unzip".into()],
            vec![
                "wget".into(),
                "-q".into(),
                format!(
                    "https://binaries.sonarsource.com/Distribution/sonar-scanner-cli/{}",
                    archive
                ),
            ],
            vec!["unzip".into(), "-q".into(), archive],
        ]
    }

    fn invoke(&self) -> Vec<String> {
        vec![
            format!("./sonar-scanner-{}-linux/bin/sonar-scanner", SCANNER_VERSION),
            format!("-Dsonar.projectKey={}", self.project_key),
            format!("-Dsonar.sources={}", WORKSPACE_MOUNT),
            format!("-Dsonar.host.url={}", self.host_url),
        ]
    }

    fn parse(&self, output: &str) -> Vec<CodeProblem> {
        let mut problems = Vec::new();

        for line in output.lines() {
            let trimmed = line.trim();
            if !trimmed.to_lowercase().contains("issue") {
                continue;
            }

            let (severity, message) = if let Some(rest) = trimmed.strip_prefix("ERROR:") {
                (Severity::Error, rest.trim())
            } else if let Some(rest) = trimmed.strip_prefix("WARN:") {
                (Severity::Warning, rest.trim())
            } else if let Some(rest) = trimmed.strip_prefix("INFO:") {
                (Severity::Warning, rest.trim())
            } else {
                (Severity::Warning, trimmed)
            };

            if message.is_empty() {
                continue;
            }

            problems.push(CodeProblem::new(
                self.name(),
                message,
                severity,
                Category::CodeSmell,
            ));
        }

        problems
    }
}
