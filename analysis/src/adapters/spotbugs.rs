//! SpotBugs adapter.
//!
//! Compiles the Java sources found in the workspace, runs the text UI, and
//! parses its one-line-per-bug output:
//!
//! ```text
//! M C NP_NULL_ON_SOME_PATH: Possible null pointer dereference in Foo.bar()  At Foo.java:[line 42]
//! ```

use crate::adapter::{Analyzer, WORKSPACE_MOUNT};
use crate::problem::{Category, CodeProblem, Severity};
use regex::Regex;

pub struct SpotBugsAdapter {
    line: Regex,
}

impl SpotBugsAdapter {
    pub fn new() -> Self {
        Self {
            line: Regex::new(
                r"^([HML])\s+([A-Z])\s+([A-Z0-9_]+):\s+(.*?)(?:\s+At\s+([\w./$-]+):\[line\s+(\d+)\])?\s*$",
            )
            .expect("spotbugs line pattern is valid"),
        }
    }
}

impl Default for SpotBugsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for SpotBugsAdapter {
    fn name(&self) -> &'static str {
        "spotbugs"
    }

    fn prepare(&self) -> Vec<Vec<String>> {
        vec![
            vec!["apt-get".into(), "update".into()],
            vec!["apt-get".into(), "install".into(), "-y".into(), "spotbugs".into(), "default-jdk-headless".into()],
            // spotbugs reads bytecode, not sources
            vec![
                "sh".into(),
                "-c".into(),
                format!("find {} -name '*.java' -exec javac {{}} +", WORKSPACE_MOUNT),
            ],
        ]
    }

    fn invoke(&self) -> Vec<String> {
        vec!["spotbugs".into(), "-textui".into(), WORKSPACE_MOUNT.into()]
    }

    fn parse(&self, output: &str) -> Vec<CodeProblem> {
        let mut problems = Vec::new();

        for line in output.lines() {
            let Some(caps) = self.line.captures(line.trim()) else {
                continue;
            };

            let severity = match &caps[1] {
                "H" => Severity::Critical,
                "M" => Severity::Error,
                _ => Severity::Warning,
            };
            let category = match &caps[2] {
                "S" => Category::SecurityHotspot,
                _ => Category::Bug,
            };
            let rule = caps[3].to_string();
            let message = caps[4].to_string();

            let mut problem =
                CodeProblem::new(self.name(), message, severity, category).with_rule(rule);
            if let (Some(file), Some(line_no)) = (caps.get(5), caps.get(6)) {
                if let Ok(line_no) = line_no.as_str().parse() {
                    problem = problem.with_location(file.as_str(), line_no);
                }
            }
            problems.push(problem);
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
The following classes needed for analysis were missing:
M C NP_NULL_ON_SOME_PATH: Possible null pointer dereference in Foo.bar()  At Foo.java:[line 42]
H S SQL_INJECTION_JDBC: Nonconstant string passed to execute  At Dao.java:[line 17]
L D REC_CATCH_EXCEPTION: Exception is caught when Exception is not thrown
Warnings generated: 3
";

    #[test]
    fn test_parse_bug_lines() {
        let adapter = SpotBugsAdapter::new();
        let problems = adapter.parse(SAMPLE);
        assert_eq!(problems.len(), 3);

        assert_eq!(problems[0].severity, Severity::Error);
        assert_eq!(problems[0].category, Category::Bug);
        assert_eq!(problems[0].rule_id.as_deref(), Some("NP_NULL_ON_SOME_PATH"));
        assert_eq!(problems[0].file_path.as_deref(), Some("Foo.java"));
        assert_eq!(problems[0].start_line, Some(42));

        assert_eq!(problems[1].severity, Severity::Critical);
        assert_eq!(problems[1].category, Category::SecurityHotspot);

        assert_eq!(problems[2].severity, Severity::Warning);
        assert_eq!(problems[2].file_path, None);
    }

    #[test]
    fn test_parse_ignores_summary_lines() {
        let adapter = SpotBugsAdapter::new();
        assert!(adapter.parse("Warnings generated: 0\n").is_empty());
        assert!(adapter.parse("").is_empty());
    }
}
