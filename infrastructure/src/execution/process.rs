//! Child process execution with a hard timeout.
//!
//! Every spawned process is pinned to a working directory, has a finite
//! timeout and is killed when that timeout expires (`kill_on_drop`).
//! Output captured before a timeout is discarded.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use dispatch_domain::util::truncate_str;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{program} not found in PATH")]
    NotFound { program: String },

    #[error("working directory {} does not exist", .cwd.display())]
    WorkingDirectory { cwd: PathBuf },

    #[error("timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Description of one process invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
    /// Fold stderr into stdout after capture.
    pub merge_stderr: bool,
    /// Written to the child's stdin, which is then closed.
    pub stdin: Option<String>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout: Duration::from_secs(10),
            merge_stderr: false,
            stdin: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn merged_stderr(mut self) -> Self {
        self.merge_stderr = true;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Locate the first available program among `candidates`.
pub fn find_program(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|name| which::which(name).ok())
}

fn cap_output(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let keep = truncate_str(&text, max_bytes).len();
        text.truncate(keep);
        text.push_str("\n... (output truncated)");
    }
    text
}

/// Run a process to completion or until its timeout expires.
pub async fn run_process(spec: &CommandSpec, max_output_bytes: usize) -> Result<ProcessOutput, ProcessError> {
    debug!(program = %spec.program.display(), cwd = %spec.cwd.display(), "Spawning process");

    // Spawn reports a missing cwd as NotFound, indistinguishable from a
    // missing program.
    if !spec.cwd.is_dir() {
        return Err(ProcessError::WorkingDirectory {
            cwd: spec.cwd.clone(),
        });
    }

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &spec.envs {
        command.env(key, value);
    }

    let mut child = command.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => ProcessError::NotFound {
            program: spec.program_name(),
        },
        _ => ProcessError::Spawn {
            program: spec.program_name(),
            source: e,
        },
    })?;

    let input = spec.stdin.clone();
    let completion = async move {
        if let (Some(data), Some(mut pipe)) = (input, child.stdin.take())
            && let Err(e) = pipe.write_all(data.as_bytes()).await
            && e.kind() != ErrorKind::BrokenPipe
        {
            return Err(e);
        }
        child.wait_with_output().await
    };

    let output = match tokio::time::timeout(spec.timeout, completion).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ProcessError::Timeout {
                timeout: spec.timeout,
            });
        }
    };

    let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if spec.merge_stderr && !stderr.is_empty() {
        stdout.push_str(&stderr);
        stderr.clear();
    }

    Ok(ProcessOutput {
        exit_code: output.status.code(),
        success: output.status.success(),
        stdout: cap_output(stdout, max_output_bytes),
        stderr: cap_output(stderr, max_output_bytes),
    })
}

/// Shell used for free-form command text on this host.
///
/// POSIX hosts use `sh -c`. Windows hosts prefer PowerShell, since
/// translated commands are rendered in PowerShell syntax, and fall back to
/// `cmd /C`.
pub fn host_shell(command: &str, cwd: &Path) -> Option<CommandSpec> {
    if cfg!(windows) {
        if let Some(ps) = find_program(&["pwsh", "powershell"]) {
            return Some(CommandSpec::new(ps, cwd).args(["-NoProfile", "-NonInteractive", "-Command", command]));
        }
        find_program(&["cmd"]).map(|cmd| CommandSpec::new(cmd, cwd).args(["/C", command]))
    } else {
        find_program(&["sh", "bash"]).map(|sh| CommandSpec::new(sh, cwd).args(["-c", command]))
    }
}
