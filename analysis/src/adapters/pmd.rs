//! PMD adapter.
//!
//! Runs `pmd check` with XML output and parses `<file>`/`<violation>`
//! elements with a tolerant line scan; anything that is not part of a
//! violation element is ignored.

use crate::adapter::{Analyzer, WORKSPACE_MOUNT};
use crate::problem::{Category, CodeProblem, Severity};
use regex::Regex;

const RULESETS: &str = "java-basic,java-braces,java-clone,java-codesize";

pub struct PmdAdapter {
    file_open: Regex,
    violation_open: Regex,
    attribute: Regex,
}

impl PmdAdapter {
    pub fn new() -> Self {
        Self {
            file_open: Regex::new(r#"<file\s+name="([^"]+)""#).expect("pmd file pattern is valid"),
            violation_open: Regex::new(r"<violation\b([^>]*)>")
                .expect("pmd violation pattern is valid"),
            attribute: Regex::new(r#"(\w+)="([^"]*)""#).expect("pmd attribute pattern is valid"),
        }
    }

    fn severity_for_priority(priority: Option<u32>) -> Severity {
        match priority {
            Some(1) | Some(2) => Severity::Error,
            Some(3) => Severity::Warning,
            Some(_) => Severity::Info,
            None => Severity::Warning,
        }
    }
}

impl Default for PmdAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PmdAdapter {
    fn name(&self) -> &'static str {
        "pmd"
    }

    fn prepare(&self) -> Vec<Vec<String>> {
        vec![
            vec!["apt-get".into(), "update".into()],
            vec!["apt-get".into(), "install".into(), "-y".into(), "pmd".into()],
        ]
    }

    fn invoke(&self) -> Vec<String> {
        vec![
            "pmd".into(),
            "check".into(),
            WORKSPACE_MOUNT.into(),
            "--format".into(),
            "xml".into(),
            "--rulesets".into(),
            RULESETS.into(),
        ]
    }

    fn parse(&self, output: &str) -> Vec<CodeProblem> {
        let mut problems = Vec::new();
        let mut current_file: Option<String> = None;
        // message text accumulates between <violation ...> and </violation>
        let mut pending: Option<(CodeProblem, String)> = None;

        for line in output.lines() {
            if let Some((mut problem, mut message)) = pending.take() {
                if let Some(end) = line.find("</violation>") {
                    if !message.is_empty() {
                        message.push(' ');
                    }
                    message.push_str(line[..end].trim());
                    problem.description = message.trim().to_string();
                    if !problem.description.is_empty() {
                        problems.push(problem);
                    }
                } else {
                    if !message.is_empty() {
                        message.push(' ');
                    }
                    message.push_str(line.trim());
                    pending = Some((problem, message));
                }
                continue;
            }

            if let Some(caps) = self.file_open.captures(line) {
                current_file = Some(caps[1].to_string());
                continue;
            }

            let Some(caps) = self.violation_open.captures(line) else {
                continue;
            };
            let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let tail_start = caps.get(0).map(|m| m.end()).unwrap_or(line.len());

            let mut begin_line = None;
            let mut end_line = None;
            let mut begin_col = None;
            let mut end_col = None;
            let mut rule = None;
            let mut priority = None;
            for attr in self.attribute.captures_iter(attrs) {
                let value = attr[2].to_string();
                match &attr[1] {
                    "beginline" => begin_line = value.parse().ok(),
                    "endline" => end_line = value.parse().ok(),
                    "begincolumn" => begin_col = value.parse().ok(),
                    "endcolumn" => end_col = value.parse().ok(),
                    "rule" => rule = Some(value),
                    "priority" => priority = value.parse().ok(),
                    _ => {}
                }
            }

            let mut problem = CodeProblem::new(
                self.name(),
                String::new(),
                Self::severity_for_priority(priority),
                Category::CodeSmell,
            );
            problem.file_path = current_file.clone();
            if let (Some(begin), Some(end)) = (begin_line, end_line) {
                problem = problem.with_range(begin, end, begin_col, end_col);
            } else {
                problem.start_line = begin_line;
            }
            if let Some(rule) = rule {
                problem = problem.with_rule(rule);
            }

            let tail = &line[tail_start..];
            if let Some(end) = tail.find("</violation>") {
                problem.description = tail[..end].trim().to_string();
                if !problem.description.is_empty() {
                    problems.push(problem);
                }
            } else {
                pending = Some((problem, tail.trim().to_string()));
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pmd version="7.0.0" timestamp="2024-01-15T10:30:00">
<file name="/workspace/src/Main.java">
<violation beginline="5" endline="8" begincolumn="9" endcolumn="20" rule="EmptyCatchBlock" ruleset="Error Prone" priority="3">
Avoid empty catch blocks
</violation>
<violation beginline="14" endline="14" rule="UnusedLocalVariable" priority="2">Avoid unused local variables such as 'x'.</violation>
</file>
</pmd>
"#;

    #[test]
    fn test_parse_violations_with_file_context() {
        let adapter = PmdAdapter::new();
        let problems = adapter.parse(SAMPLE);
        assert_eq!(problems.len(), 2);

        assert_eq!(problems[0].description, "Avoid empty catch blocks");
        assert_eq!(
            problems[0].file_path.as_deref(),
            Some("/workspace/src/Main.java")
        );
        assert_eq!(problems[0].start_line, Some(5));
        assert_eq!(problems[0].end_line, Some(8));
        assert_eq!(problems[0].start_column, Some(9));
        assert_eq!(problems[0].end_column, Some(20));
        assert_eq!(problems[0].rule_id.as_deref(), Some("EmptyCatchBlock"));
        assert_eq!(problems[0].severity, Severity::Warning);

        assert_eq!(problems[1].severity, Severity::Error);
        assert_eq!(
            problems[1].description,
            "Avoid unused local variables such as 'x'."
        );
    }

    #[test]
    fn test_parse_tolerates_junk() {
        let adapter = PmdAdapter::new();
        assert!(adapter.parse("").is_empty());
        assert!(adapter.parse("no xml here\njust noise\n").is_empty());
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(PmdAdapter::severity_for_priority(Some(1)), Severity::Error);
        assert_eq!(
            PmdAdapter::severity_for_priority(Some(3)),
            Severity::Warning
        );
        assert_eq!(PmdAdapter::severity_for_priority(Some(5)), Severity::Info);
        assert_eq!(PmdAdapter::severity_for_priority(None), Severity::Warning);
    }
}
