//! Uniform problem model produced by every analyzer adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How serious a reported problem is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// What kind of problem was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Bug,
    Vulnerability,
    CodeSmell,
    SecurityHotspot,
}

/// One problem found in a project's source tree.
///
/// Adapters produce these; the coordinator aggregates them; persisting the
/// final list belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeProblem {
    pub id: Uuid,
    /// Name of the analyzer that reported the problem
    pub tool: String,
    pub description: String,
    pub severity: Severity,
    pub category: Category,
    pub file_path: Option<String>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub start_column: Option<u32>,
    pub end_column: Option<u32>,
    /// Identifier of the rule that fired, when the tool reports one
    pub rule_id: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CodeProblem {
    pub fn new(
        tool: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        category: Category,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool: tool.into(),
            description: description.into(),
            severity,
            category,
            file_path: None,
            start_line: None,
            end_line: None,
            start_column: None,
            end_column: None,
            rule_id: None,
            resolved: false,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, file_path: impl Into<String>, line: u32) -> Self {
        self.file_path = Some(file_path.into());
        self.start_line = Some(line);
        self
    }

    pub fn with_range(
        mut self,
        start_line: u32,
        end_line: u32,
        start_column: Option<u32>,
        end_column: Option<u32>,
    ) -> Self {
        self.start_line = Some(start_line);
        self.end_line = Some(end_line);
        self.start_column = start_column;
        self.end_column = end_column;
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Mark the problem resolved, stamping the resolution time once.
    pub fn resolve(&mut self) {
        self.resolved = true;
        if self.resolved_at.is_none() {
            self.resolved_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_builder() {
        let problem = CodeProblem::new(
            "checkstyle",
            "missing javadoc",
            Severity::Warning,
            Category::CodeSmell,
        )
        .with_location("src/Main.java", 12)
        .with_rule("JavadocMethod");

        assert_eq!(problem.tool, "checkstyle");
        assert_eq!(problem.start_line, Some(12));
        assert_eq!(problem.rule_id.as_deref(), Some("JavadocMethod"));
        assert!(!problem.resolved);
    }

    #[test]
    fn test_resolve_stamps_once() {
        let mut problem =
            CodeProblem::new("pmd", "empty catch block", Severity::Error, Category::Bug);
        problem.resolve();
        let first = problem.resolved_at;
        assert!(problem.resolved);
        assert!(first.is_some());

        problem.resolve();
        assert_eq!(problem.resolved_at, first);
    }

    #[test]
    fn test_serde_round_trip_uses_stable_names() {
        let problem = CodeProblem::new(
            "spotbugs",
            "possible null dereference",
            Severity::Critical,
            Category::SecurityHotspot,
        );
        let json = serde_json::to_string(&problem).unwrap();
        assert!(json.contains("\"critical\""));
        assert!(json.contains("\"security-hotspot\""));

        let back: CodeProblem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.severity, Severity::Critical);
        assert_eq!(back.category, Category::SecurityHotspot);
    }
}
