//! Leaf subprocess executor.
//!
//! Runs an external executable to completion in a given working directory,
//! capturing stdout and stderr separately. Nothing here knows about git or
//! containers; callers supply the program, the argument list, and any
//! environment overrides they need.

use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors that can occur while running an external command
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited with a non-zero status
    #[error("{program} exited with code {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stdout: String,
        stderr: String,
    },
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Captured output of a completed command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

/// Run a command to completion and capture its output.
///
/// Stdin is closed so the child can never sit on an interactive prompt.
/// A non-zero exit status is surfaced as [`CommandError::Failed`] carrying
/// the captured stderr; callers decide whether that is fatal or tolerable.
pub fn run_command(
    program: &str,
    args: &[&str],
    cwd: &Path,
    envs: &[(&str, &str)],
) -> CommandResult<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (key, value) in envs {
        cmd.env(key, value);
    }

    let output = cmd.output().map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let status = output.status.code().unwrap_or(-1);

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            code: status,
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        status,
    })
}
