//! Checkstyle adapter.
//!
//! Runs checkstyle with the bundled Google ruleset and parses its plain
//! formatter output, one finding per line:
//!
//! ```text
//! [WARN] /workspace/src/Main.java:12:5: Missing a Javadoc comment. [JavadocMethod]
//! ```

use crate::adapter::{Analyzer, WORKSPACE_MOUNT};
use crate::problem::{Category, CodeProblem, Severity};
use regex::Regex;

pub struct CheckstyleAdapter {
    line: Regex,
}

impl CheckstyleAdapter {
    pub fn new() -> Self {
        Self {
            line: Regex::new(
                r"^\[(ERROR|WARN|INFO)\]\s+([^:]+):(\d+)(?::(\d+))?:\s+(.*?)(?:\s+\[([A-Za-z0-9_]+)\])?\s*$",
            )
            .expect("checkstyle line pattern is valid"),
        }
    }
}

impl Default for CheckstyleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for CheckstyleAdapter {
    fn name(&self) -> &'static str {
        "checkstyle"
    }

    fn prepare(&self) -> Vec<Vec<String>> {
        vec![
            vec!["apt-get".into(), "update".into()],
            vec!["apt-get".into(), "install".into(), "-y".into(), "checkstyle".into()],
        ]
    }

    fn invoke(&self) -> Vec<String> {
        vec![
            "checkstyle".into(),
            "-c".into(),
            "/google_checks.xml".into(),
            WORKSPACE_MOUNT.into(),
        ]
    }

    fn parse(&self, output: &str) -> Vec<CodeProblem> {
        let mut problems = Vec::new();

        for line in output.lines() {
            let Some(caps) = self.line.captures(line.trim()) else {
                continue;
            };

            let severity = match &caps[1] {
                "ERROR" => Severity::Error,
                "WARN" => Severity::Warning,
                _ => Severity::Info,
            };
            let file = caps[2].to_string();
            let line_no: u32 = caps[3].parse().unwrap_or(0);
            let column = caps.get(4).and_then(|c| c.as_str().parse().ok());
            let message = caps[5].to_string();

            let mut problem = CodeProblem::new(self.name(), message, severity, Category::CodeSmell)
                .with_location(file, line_no);
            problem.start_column = column;
            if let Some(rule) = caps.get(6) {
                problem = problem.with_rule(rule.as_str());
            }
            problems.push(problem);
        }

        problems
    }
}
