//! Analyzer adapter interface and the shared container-driving runner.
//!
//! Each adapter knows three things about its tool: how to provision it
//! inside a sandbox, how to invoke it, and how to parse its output into the
//! uniform problem model. The runner owns the container lifecycle so that
//! teardown happens on every exit path, success or failure.

use crate::container::{ContainerClient, ContainerError, ContainerHandle};
use crate::problem::CodeProblem;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Path the project tree is copied to inside every sandbox
pub const WORKSPACE_MOUNT: &str = "/workspace";

/// Failure of one analyzer run; contained at the adapter boundary
#[derive(Error, Debug)]
pub enum ToolError {
    /// The sandbox itself failed (provision, copy, exec transport)
    #[error("container operation failed: {0}")]
    Container(#[from] ContainerError),

    /// The tool could not be invoked inside the sandbox
    #[error("{tool} invocation failed: {reason}")]
    Invoke { tool: String, reason: String },
}

pub type ToolResult<T> = Result<T, ToolError>;

/// One static-analysis tool, behind the uniform problem-producing interface.
///
/// `parse` is a pure function from raw tool output to problems: it must
/// tolerate and skip unrecognized lines rather than fail the whole parse,
/// so a tool's output-format drift stays a local, testable change.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Commands that install or unpack the tool inside the sandbox.
    /// Individual non-zero exits are logged and tolerated; the invocation
    /// step decides whether the tool is actually usable.
    fn prepare(&self) -> Vec<Vec<String>>;

    /// The analysis command itself, run against [`WORKSPACE_MOUNT`].
    fn invoke(&self) -> Vec<String>;

    /// Turn raw tool output into problems, skipping anything unrecognized.
    fn parse(&self, output: &str) -> Vec<CodeProblem>;
}

/// Run one analyzer in its own sandbox.
///
/// Provisions a container, copies the project tree in, prepares and invokes
/// the tool, parses its output, and tears the container down regardless of
/// how any of those steps went.
pub fn run_analyzer(
    client: &dyn ContainerClient,
    owner: &str,
    project: &str,
    source: &Path,
    analyzer: &dyn Analyzer,
) -> ToolResult<Vec<CodeProblem>> {
    let handle = client.provision(owner, project)?;

    let result = drive(client, &handle, source, analyzer);

    if let Err(err) = client.teardown(&handle) {
        warn!(tool = analyzer.name(), error = %err, "sandbox teardown failed");
    }

    result
}

fn drive(
    client: &dyn ContainerClient,
    handle: &ContainerHandle,
    source: &Path,
    analyzer: &dyn Analyzer,
) -> ToolResult<Vec<CodeProblem>> {
    client.copy_in(handle, source, WORKSPACE_MOUNT)?;

    for command in analyzer.prepare() {
        let output = client.exec(handle, &command)?;
        if output.status != 0 {
            warn!(
                tool = analyzer.name(),
                command = %command.join(" "),
                status = output.status,
                "provisioning command exited non-zero"
            );
        }
    }

    let invocation = analyzer.invoke();
    let output = client.exec(handle, &invocation)?;
    debug!(
        tool = analyzer.name(),
        status = output.status,
        "analyzer finished"
    );

    let problems = analyzer.parse(&output.combined());
    Ok(problems)
}
