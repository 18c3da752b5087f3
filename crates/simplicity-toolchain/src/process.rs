//! External process execution
//!
//! Everything that spawns a child process goes through [`CommandRunner`], so
//! the gateway can be exercised in tests with a scripted runner that records
//! every invocation instead of spawning anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, ToolchainError};

/// The three external binaries the toolchain drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binary {
    /// SimplicityHL compiler
    Compiler,
    /// General program inspection build
    Inspector,
    /// PSET signing-workflow build
    Signer,
}

impl Binary {
    pub const ALL: [Binary; 3] = [Binary::Compiler, Binary::Inspector, Binary::Signer];

    /// Unqualified program name resolved through PATH
    pub fn default_program(self) -> &'static str {
        match self {
            Binary::Compiler => "simc",
            Binary::Inspector => "hal-simplicity",
            Binary::Signer => "hal-simplicity-pset",
        }
    }

    /// How to get this binary onto the machine
    pub fn install_hint(self) -> &'static str {
        match self {
            Binary::Compiler => {
                "Install the SimplicityHL compiler: cargo install simplicityhl \
                 (provides `simc`), or set SIMC_PATH to an existing build."
            }
            Binary::Inspector => {
                "Install hal-simplicity: cargo install --git \
                 https://github.com/BlockstreamResearch/hal-simplicity \
                 (provides `hal-simplicity`), or set HAL_SIMPLICITY_PATH."
            }
            Binary::Signer => {
                "Install the PSET-capable hal-simplicity build from its pset branch \
                 and expose it as `hal-simplicity-pset`, or set HAL_SIMPLICITY_PSET_PATH."
            }
        }
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binary::Compiler => write!(f, "compiler"),
            Binary::Inspector => write!(f, "inspector"),
            Binary::Signer => write!(f, "signer"),
        }
    }
}

/// Captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Diagnostic text for a failed run: stderr, else stdout, else exit code
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("process exited with status {}", code),
            None => "process terminated by signal".to_string(),
        }
    }
}

/// A single process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            stdin: None,
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }
}

/// Spawns external programs
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be resolved for execution
    fn is_available(&self, program: &str) -> bool;

    /// Run a program to completion
    ///
    /// A non-zero exit is not an error here; it is reported through
    /// [`CommandOutput::success`]. Errors are reserved for spawn failures and
    /// timeouts.
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput>;
}

/// Runner backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        resolve_program(program).is_some()
    }

    async fn run(&self, invocation: Invocation) -> Result<CommandOutput> {
        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            "Spawning external process"
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| ToolchainError::Spawn {
            program: invocation.program.clone(),
            message: e.to_string(),
        })?;

        if let Some(input) = &invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await?;
            }
        }

        // Dropping the wait future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    program = %invocation.program,
                    timeout_secs = invocation.timeout.as_secs(),
                    "External process timed out"
                );
                return Err(ToolchainError::Timeout {
                    program: invocation.program,
                    secs: invocation.timeout.as_secs(),
                });
            }
        };

        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            program = %invocation.program,
            success = result.success,
            exit_code = ?result.exit_code,
            "External process finished"
        );

        Ok(result)
    }
}

/// Resolve a program name the way the OS would when spawning it
///
/// Names containing a path separator are checked as paths; bare names are
/// searched for on `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    let program = program.trim();
    if program.is_empty() {
        return None;
    }

    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return is_executable(as_path).then(|| as_path.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program), dir.join(format!("{}.exe", program))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = CommandOutput {
            success: false,
            exit_code: Some(2),
            stdout: "partial".to_string(),
            stderr: "  error: boom \n".to_string(),
        };
        assert_eq!(output.diagnostic(), "error: boom");
    }

    #[test]
    fn test_diagnostic_falls_back_to_exit_code() {
        let output = CommandOutput {
            success: false,
            exit_code: Some(3),
            ..Default::default()
        };
        assert_eq!(output.diagnostic(), "process exited with status 3");
    }

    #[test]
    fn test_resolve_missing_program() {
        assert!(resolve_program("definitely-not-a-real-simplicity-binary-xyz").is_none());
        assert!(resolve_program("").is_none());
        assert!(resolve_program("/nonexistent/dir/simc").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_explicit_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simc");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(resolve_program(path.to_str().unwrap()), Some(path));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let runner = SystemRunner::new();
        let output = runner
            .run(Invocation::new(
                "sh",
                vec!["-c".to_string(), "echo out; echo err >&2; exit 4".to_string()],
                Duration::from_secs(10),
            ))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(4));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_feeds_stdin() {
        let runner = SystemRunner::new();
        let output = runner
            .run(Invocation::new("cat", vec![], Duration::from_secs(10)).with_stdin("zSQIS29W"))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.stdout, "zSQIS29W");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_times_out() {
        let runner = SystemRunner::new();
        let err = runner
            .run(Invocation::new(
                "sleep",
                vec!["5".to_string()],
                Duration::from_millis(100),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolchainError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure() {
        let runner = SystemRunner::new();
        let err = runner
            .run(Invocation::new(
                "definitely-not-a-real-simplicity-binary-xyz",
                vec![],
                Duration::from_secs(1),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolchainError::Spawn { .. }));
    }
}
