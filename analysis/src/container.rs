//! Container runtime client.
//!
//! Wraps the container engine's CLI (podman preferred, docker fallback) to
//! provision ephemeral, resource-bounded sandboxes for analysis runs: one
//! deterministically named volume and container per {owner, project} pair,
//! hard memory and CPU ceilings, no auto-restart, archive-style file
//! transfer, in-container command execution, and stop-then-force-remove
//! teardown. Callers must invoke [`ContainerClient::teardown`] on every
//! exit path; a leaked container is a defect, not an error mode.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Container runtime types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    /// Podman container runtime
    Podman,
    /// Docker container runtime
    Docker,
    /// No container runtime available
    None,
}

impl ContainerRuntime {
    /// Get the command name for this runtime
    pub fn command(&self) -> &'static str {
        match self {
            ContainerRuntime::Podman => "podman",
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::None => "",
        }
    }

    /// Check if this runtime is available
    pub fn is_available(&self) -> bool {
        matches!(self, ContainerRuntime::Podman | ContainerRuntime::Docker)
    }
}

/// Detect available container runtime in order of preference
pub fn detect_runtime() -> ContainerRuntime {
    // Podman first, rootless setups tend to prefer it
    if Command::new("podman")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
    {
        return ContainerRuntime::Podman;
    }

    if Command::new("docker")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
    {
        return ContainerRuntime::Docker;
    }

    ContainerRuntime::None
}

/// Container operation errors
#[derive(Error, Debug)]
pub enum ContainerError {
    /// No container runtime is available
    #[error("no container runtime available; install podman or docker to run analysis sandboxes")]
    NoRuntimeAvailable,

    /// The backing volume could not be created
    #[error("failed to create volume '{name}': {reason}")]
    VolumeCreateFailed { name: String, reason: String },

    /// The sandbox container failed to start
    #[error("failed to start container '{name}': {reason}")]
    StartFailed { name: String, reason: String },

    /// Archive transfer into or out of the container failed
    #[error("failed to copy {direction} container '{name}': {reason}")]
    CopyFailed {
        name: String,
        direction: &'static str,
        reason: String,
    },

    /// A command could not be executed inside the container
    #[error("failed to exec in container '{name}': {reason}")]
    ExecFailed { name: String, reason: String },

    /// The container could not be removed
    #[error("failed to tear down container '{name}': {reason}")]
    TeardownFailed { name: String, reason: String },

    /// The runtime binary itself could not be invoked
    #[error("container runtime invocation failed: {command}")]
    CommandFailed { command: String },
}

pub type ContainerResult<T> = Result<T, ContainerError>;

/// Resource and image settings for analysis sandboxes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Base image for analysis containers
    pub image: String,
    /// Hard memory ceiling in megabytes
    pub memory_limit_mb: u64,
    /// CPU quota as a fraction of one core
    pub cpu_quota: f64,
    /// Grace period given to `stop` before the force-remove
    pub stop_grace: Duration,
    /// Upper bound on one analyzer's total run
    pub tool_timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: "ubuntu:24.04".to_string(),
            memory_limit_mb: 512,
            cpu_quota: 0.5,
            stop_grace: Duration::from_secs(10),
            tool_timeout: Duration::from_secs(300),
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_memory_limit_mb(mut self, limit: u64) -> Self {
        self.memory_limit_mb = limit;
        self
    }

    pub fn with_cpu_quota(mut self, quota: f64) -> Self {
        self.cpu_quota = quota;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.image.is_empty() {
            return Err("Image cannot be empty".to_string());
        }
        if self.memory_limit_mb == 0 {
            return Err("Memory limit must be greater than 0".to_string());
        }
        if self.cpu_quota <= 0.0 {
            return Err("CPU quota must be greater than 0".to_string());
        }
        if self.tool_timeout.is_zero() {
            return Err("Tool timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Handle for one provisioned sandbox
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    /// Container name
    pub name: String,
    /// Backing volume name (persistent, reused per project)
    pub volume: String,
}

/// Output of a command run inside a container.
///
/// A non-zero exit status is data, not an error: analyzers routinely exit
/// non-zero when they find violations.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ExecOutput {
    /// Stdout and stderr concatenated, for parsers that read both streams.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Management interface over the container engine.
///
/// Object-safe and synchronous: adapters run it on blocking tasks.
pub trait ContainerClient: Send + Sync {
    /// Create the project volume (if absent) and start a bounded sandbox.
    fn provision(&self, owner: &str, project: &str) -> ContainerResult<ContainerHandle>;

    /// Copy a filesystem subtree from the host into the container.
    fn copy_in(&self, handle: &ContainerHandle, host_path: &Path, dest: &str)
        -> ContainerResult<()>;

    /// Copy a filesystem subtree out of the container onto the host.
    fn copy_out(&self, handle: &ContainerHandle, src: &str, host_path: &Path)
        -> ContainerResult<()>;

    /// Run a command to completion inside the running container.
    fn exec(&self, handle: &ContainerHandle, argv: &[String]) -> ContainerResult<ExecOutput>;

    /// Retrieve the container's log output.
    fn logs(&self, handle: &ContainerHandle) -> ContainerResult<String>;

    /// Stop with a bounded grace period, then force-remove.
    fn teardown(&self, handle: &ContainerHandle) -> ContainerResult<()>;
}

/// [`ContainerClient`] backed by the podman/docker CLI.
pub struct CliContainerClient {
    runtime: ContainerRuntime,
    config: SandboxConfig,
}

impl CliContainerClient {
    /// Detect a runtime and build a client; fails when neither podman nor
    /// docker is installed.
    pub fn new(config: SandboxConfig) -> ContainerResult<Self> {
        let runtime = detect_runtime();
        if !runtime.is_available() {
            return Err(ContainerError::NoRuntimeAvailable);
        }
        Ok(Self { runtime, config })
    }

    /// Build a client for a specific runtime (used by tests).
    pub fn with_runtime(runtime: ContainerRuntime, config: SandboxConfig) -> Self {
        Self { runtime, config }
    }

    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    fn run(&self, args: &[&str]) -> ContainerResult<std::process::Output> {
        Command::new(self.runtime.command())
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|_| ContainerError::CommandFailed {
                command: format!("{} {}", self.runtime.command(), args.join(" ")),
            })
    }
}

/// Deterministic volume name for a project workspace
pub fn volume_name(owner: &str, project: &str) -> String {
    format!("workspace-{}-{}", owner, project)
}

/// Deterministic container name for a project's analysis sandbox
pub fn container_name(owner: &str, project: &str) -> String {
    format!("atelier-analysis-{}-{}", owner, project)
}

impl ContainerClient for CliContainerClient {
    fn provision(&self, owner: &str, project: &str) -> ContainerResult<ContainerHandle> {
        if !self.runtime.is_available() {
            return Err(ContainerError::NoRuntimeAvailable);
        }

        let volume = volume_name(owner, project);
        let name = container_name(owner, project);

        let output = self.run(&["volume", "create", &volume])?;
        if !output.status.success() {
            return Err(ContainerError::VolumeCreateFailed {
                name: volume,
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        // a stale sandbox with the same name would collide; remove it first
        let _ = self.run(&["rm", "-f", &name]);

        let memory = format!("{}m", self.config.memory_limit_mb);
        let cpus = format!("{}", self.config.cpu_quota);
        let mount = format!("{}:/workspace", volume);

        info!(container = %name, "starting analysis sandbox");
        let output = self.run(&[
            "run",
            "-d",
            "--name",
            &name,
            "--memory",
            &memory,
            "--cpus",
            &cpus,
            "--restart",
            "no",
            "-v",
            &mount,
            &self.config.image,
            "sleep",
            "infinity",
        ])?;

        if !output.status.success() {
            return Err(ContainerError::StartFailed {
                name,
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(ContainerHandle { name, volume })
    }

    fn copy_in(
        &self,
        handle: &ContainerHandle,
        host_path: &Path,
        dest: &str,
    ) -> ContainerResult<()> {
        // trailing `/.` copies the directory contents rather than nesting
        // the directory itself under the destination
        let source = format!("{}/.", host_path.to_string_lossy());
        let target = format!("{}:{}", handle.name, dest);

        let output = self.run(&["cp", &source, &target])?;
        if !output.status.success() {
            return Err(ContainerError::CopyFailed {
                name: handle.name.clone(),
                direction: "into",
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        debug!(container = %handle.name, "copied project tree in");
        Ok(())
    }

    fn copy_out(
        &self,
        handle: &ContainerHandle,
        src: &str,
        host_path: &Path,
    ) -> ContainerResult<()> {
        let source = format!("{}:{}", handle.name, src);
        let target = host_path.to_string_lossy();

        let output = self.run(&["cp", &source, target.as_ref()])?;
        if !output.status.success() {
            return Err(ContainerError::CopyFailed {
                name: handle.name.clone(),
                direction: "out of",
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        Ok(())
    }

    fn exec(&self, handle: &ContainerHandle, argv: &[String]) -> ContainerResult<ExecOutput> {
        let mut args: Vec<&str> = vec!["exec", &handle.name];
        args.extend(argv.iter().map(|s| s.as_str()));

        let output = self.run(&args)?;
        let exec = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status.code().unwrap_or(-1),
        };

        // distinguish "the tool exited non-zero" (data) from "the runtime
        // could not exec at all" (error): the latter leaves no stdout and
        // reports on stderr with a 125/126/127-style status
        if exec.status != 0 && exec.stdout.is_empty() && exec.status >= 125 {
            return Err(ContainerError::ExecFailed {
                name: handle.name.clone(),
                reason: exec.stderr.trim().to_string(),
            });
        }

        Ok(exec)
    }

    fn logs(&self, handle: &ContainerHandle) -> ContainerResult<String> {
        let output = self.run(&["logs", &handle.name])?;
        if !output.status.success() {
            return Err(ContainerError::ExecFailed {
                name: handle.name.clone(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        // the engine multiplexes both streams into the log
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }

    fn teardown(&self, handle: &ContainerHandle) -> ContainerResult<()> {
        let grace = format!("{}", self.config.stop_grace.as_secs());

        let stop = self.run(&["stop", "-t", &grace, &handle.name])?;
        if !stop.status.success() {
            warn!(container = %handle.name, "stop failed; forcing removal");
        }

        let remove = self.run(&["rm", "-f", &handle.name])?;
        if !remove.status.success() {
            return Err(ContainerError::TeardownFailed {
                name: handle.name.clone(),
                reason: String::from_utf8_lossy(&remove.stderr).to_string(),
            });
        }

        info!(container = %handle.name, "sandbox torn down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_runtime_command() {
        assert_eq!(ContainerRuntime::Podman.command(), "podman");
        assert_eq!(ContainerRuntime::Docker.command(), "docker");
        assert_eq!(ContainerRuntime::None.command(), "");
    }

    #[test]
    fn test_container_runtime_availability() {
        assert!(ContainerRuntime::Podman.is_available());
        assert!(ContainerRuntime::Docker.is_available());
        assert!(!ContainerRuntime::None.is_available());
    }

    #[test]
    fn test_detect_runtime_returns_valid_variant() {
        match detect_runtime() {
            ContainerRuntime::Podman | ContainerRuntime::Docker | ContainerRuntime::None => {}
        }
    }

    #[test]
    fn test_deterministic_names() {
        assert_eq!(volume_name("7", "widget"), "workspace-7-widget");
        assert_eq!(
            container_name("7", "widget"),
            "atelier-analysis-7-widget"
        );
        // same pair, same names: a re-provision reuses the volume
        assert_eq!(volume_name("7", "widget"), volume_name("7", "widget"));
    }

    #[test]
    fn test_sandbox_config_defaults_and_validation() {
        let config = SandboxConfig::default();
        assert_eq!(config.memory_limit_mb, 512);
        assert_eq!(config.cpu_quota, 0.5);
        assert_eq!(config.tool_timeout, Duration::from_secs(300));
        assert!(config.validate().is_ok());

        let config = SandboxConfig::new().with_memory_limit_mb(0);
        assert!(config.validate().is_err());

        let config = SandboxConfig::new().with_cpu_quota(-1.0);
        assert!(config.validate().is_err());

        let config = SandboxConfig::new().with_image("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provision_without_runtime_fails() {
        let client =
            CliContainerClient::with_runtime(ContainerRuntime::None, SandboxConfig::default());
        let result = client.provision("1", "demo");
        assert!(matches!(result, Err(ContainerError::NoRuntimeAvailable)));
    }

    #[test]
    fn test_exec_output_combined() {
        let output = ExecOutput {
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            status: 0,
        };
        assert_eq!(output.combined(), "out\nerr");

        let output = ExecOutput {
            stdout: "only".to_string(),
            stderr: String::new(),
            status: 0,
        };
        assert_eq!(output.combined(), "only");
    }

    #[test]
    fn test_container_error_display() {
        let error = ContainerError::NoRuntimeAvailable;
        assert!(error.to_string().contains("no container runtime available"));

        let error = ContainerError::StartFailed {
            name: "atelier-analysis-1-demo".to_string(),
            reason: "image not found".to_string(),
        };
        assert!(error.to_string().contains("atelier-analysis-1-demo"));
        assert!(error.to_string().contains("image not found"));
    }
}
