//! Code execution engine
//!
//! Runs snippets in python, javascript, shell/bash, powershell, cmd and
//! lua. Every external interpreter runs as a child process pinned to the
//! workspace root with a hard timeout; lua runs in an in-process sandbox.
//!
//! | Language | Program | Timeout |
//! |----------|---------|---------|
//! | python | `python3` / `python` + sandbox runner | default |
//! | javascript | `node -e` | default |
//! | shell, bash | `bash -c` / `sh -c` (Windows: git-bash, else `cmd /C`) | default |
//! | powershell | `pwsh` / `powershell -Command` | shell host |
//! | cmd | `cmd /C` (Windows only) | shell host |
//! | lua | in-process VM (`scripting` feature) | default |

#[cfg(feature = "scripting")]
pub mod lua;
pub mod process;
pub mod python;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_application::config::EngineSettings;
use dispatch_application::ports::strategy::{ResolverStrategy, StrategyFault};
use dispatch_domain::command::Platform;
use dispatch_domain::tool::{
    CodeLanguage, CodeTarget, Outcome, ResolverOutcome, ToolCall, code_target,
};
use tracing::debug;

pub use process::{
    CommandSpec, ProcessError, ProcessOutput, find_program, host_shell, run_process,
};
pub use python::{PreparedSnippet, PythonRunner};

const CODE_KEYS: &[&str] = &["code", "script", "source", "command"];

fn dependency_message(language: CodeLanguage) -> &'static str {
    match language {
        CodeLanguage::Python => {
            "Python execution requires Python to be installed (python3 or python not found in PATH)"
        }
        CodeLanguage::JavaScript => {
            "JavaScript execution requires Node.js to be installed (node not found in PATH)"
        }
        CodeLanguage::Shell | CodeLanguage::Bash => {
            "Shell execution requires bash or sh to be installed (neither found in PATH)"
        }
        CodeLanguage::PowerShell => {
            "PowerShell execution requires PowerShell to be installed (pwsh or powershell not found in PATH)"
        }
        CodeLanguage::Cmd => "CMD execution is only available on Windows",
        CodeLanguage::Lua => "Lua execution requires the scripting feature",
    }
}

pub struct CodeExecutionEngine {
    workspace_root: PathBuf,
    settings: EngineSettings,
    platform: Platform,
    python: PythonRunner,
}

impl CodeExecutionEngine {
    pub fn new(workspace_root: impl Into<PathBuf>, settings: EngineSettings) -> Self {
        let python = PythonRunner::new(
            settings.python_interpreters.clone(),
            settings.default_timeout,
            settings.allow_system_profile,
        );
        Self {
            workspace_root: workspace_root.into(),
            settings,
            platform: Platform::host(),
            python,
        }
    }

    /// Language named by the call, or `None` for an unsupported `language` argument.
    fn language_for(&self, call: &ToolCall) -> Option<CodeLanguage> {
        match code_target(&call.name)? {
            CodeTarget::Language(language) => Some(language),
            CodeTarget::FromArgument => match call.get_string("language") {
                Some(name) if !name.trim().is_empty() => CodeLanguage::from_name(name),
                _ => Some(CodeLanguage::Python),
            },
        }
    }

    /// Execute `code` as `language`.
    pub async fn execute(&self, language: CodeLanguage, code: &str) -> Outcome {
        if code.trim().is_empty() {
            return Outcome::invalid_argument("No code provided");
        }
        debug!(language = language.display_name(), "Executing code");

        match language {
            CodeLanguage::Python => self.run_python(code).await,
            CodeLanguage::JavaScript => {
                let Some(node) = find_program(&["node"]) else {
                    return Outcome::dependency_missing(dependency_message(language));
                };
                let spec = self.spec(node, self.settings.default_timeout).args(["-e", code]);
                self.finish(language, &spec).await
            }
            CodeLanguage::Shell | CodeLanguage::Bash => {
                let spec = if self.platform.is_windows() {
                    match find_program(&["bash"]) {
                        Some(bash) => self.spec(bash, self.settings.default_timeout).args(["-c", code]),
                        None => match find_program(&["cmd"]) {
                            Some(cmd) => self.spec(cmd, self.settings.default_timeout).args(["/C", code]),
                            None => return Outcome::dependency_missing(dependency_message(language)),
                        },
                    }
                } else {
                    match find_program(&["bash", "sh"]) {
                        Some(sh) => self.spec(sh, self.settings.default_timeout).args(["-c", code]),
                        None => return Outcome::dependency_missing(dependency_message(language)),
                    }
                };
                self.finish(language, &spec).await
            }
            CodeLanguage::PowerShell => {
                let Some(ps) = find_program(&["pwsh", "powershell"]) else {
                    return Outcome::dependency_missing(dependency_message(language));
                };
                let spec = self
                    .spec(ps, self.settings.shell_host_timeout)
                    .args(["-NoProfile", "-NonInteractive", "-Command", code]);
                self.finish(language, &spec).await
            }
            CodeLanguage::Cmd => {
                let cmd = match (self.platform.is_windows(), find_program(&["cmd"])) {
                    (true, Some(cmd)) => cmd,
                    _ => return Outcome::dependency_missing(dependency_message(language)),
                };
                let spec = self
                    .spec(cmd, self.settings.shell_host_timeout)
                    .args(["/C", code])
                    .merged_stderr();
                self.finish(language, &spec).await
            }
            CodeLanguage::Lua => self.run_lua(code).await,
        }
    }

    fn spec(&self, program: PathBuf, timeout: Duration) -> CommandSpec {
        CommandSpec::new(program, &self.workspace_root).with_timeout(timeout)
    }

    async fn run_python(&self, code: &str) -> Outcome {
        let snippet = self.python.prepare(code);
        let Some(spec) = self.python.command_spec(&snippet, &self.workspace_root) else {
            return Outcome::dependency_missing(dependency_message(CodeLanguage::Python));
        };
        debug!(profile = %snippet.profile, "Running python snippet");

        match run_process(&spec, self.settings.max_output_bytes).await {
            Ok(out) if out.success && out.stdout.is_empty() => {
                Outcome::completed("Code executed successfully")
            }
            Ok(out) if out.success => Outcome::completed(out.stdout),
            result => classify(CodeLanguage::Python, result),
        }
    }

    #[cfg(feature = "scripting")]
    async fn run_lua(&self, code: &str) -> Outcome {
        let code = code.to_string();
        let timeout = self.settings.default_timeout;
        match tokio::task::spawn_blocking(move || lua::execute_lua(&code, timeout)).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::execution_failure(format!("Lua execution error: {}", e)),
        }
    }

    #[cfg(not(feature = "scripting"))]
    async fn run_lua(&self, _code: &str) -> Outcome {
        Outcome::dependency_missing(dependency_message(CodeLanguage::Lua))
    }

    async fn finish(&self, language: CodeLanguage, spec: &CommandSpec) -> Outcome {
        match run_process(spec, self.settings.max_output_bytes).await {
            Ok(out) if out.success => {
                let mut text = out.stdout.trim_end_matches('\n').to_string();
                if !out.stderr.trim().is_empty() {
                    text.push_str("\nSTDERR:\n");
                    text.push_str(out.stderr.trim_end());
                }
                if text.trim().is_empty() {
                    Outcome::completed(format!(
                        "{} code executed successfully (no output)",
                        language.display_name()
                    ))
                } else {
                    Outcome::completed(text)
                }
            }
            result => classify(language, result),
        }
    }
}

/// Map a failed or unsuccessful run onto the failure taxonomy.
fn classify(language: CodeLanguage, result: Result<ProcessOutput, ProcessError>) -> Outcome {
    let name = language.display_name();
    match result {
        Ok(out) => {
            let detail = if out.stderr.trim().is_empty() { &out.stdout } else { &out.stderr };
            Outcome::execution_failure(format!("{} error: {}", name, detail.trim_end()))
        }
        Err(ProcessError::Timeout { timeout }) => Outcome::timeout(format!(
            "{} command timed out after {}s",
            name,
            timeout.as_secs()
        )),
        Err(ProcessError::NotFound { .. }) => Outcome::dependency_missing(dependency_message(language)),
        Err(e) => Outcome::execution_failure(format!("{} execution error: {}", name, e)),
    }
}

#[async_trait]
impl ResolverStrategy for CodeExecutionEngine {
    fn name(&self) -> &'static str {
        "code_execution"
    }

    fn applies(&self, call: &ToolCall) -> bool {
        code_target(&call.name).is_some()
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        let language = self.language_for(call).ok_or_else(|| {
            StrategyFault::apply(
                self.name(),
                format!(
                    "unsupported language '{}'",
                    call.get_string("language").unwrap_or_default()
                ),
            )
        })?;
        let code = call.first_string(CODE_KEYS).unwrap_or_default();
        Ok(self.execute(language, code).await.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_domain::tool::FailureKind;

    fn engine(dir: &std::path::Path) -> CodeExecutionEngine {
        CodeExecutionEngine::new(dir, EngineSettings::default())
    }

    fn has(program: &str) -> bool {
        which::which(program).is_ok()
    }

    #[tokio::test]
    async fn test_empty_code_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(dir.path()).execute(CodeLanguage::Python, "   \n").await;
        assert_eq!(outcome.text(), "No code provided");
    }

    #[tokio::test]
    async fn test_missing_workspace_is_not_a_missing_interpreter() {
        if !has("sh") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(&dir.path().join("gone"))
            .execute(CodeLanguage::Shell, "echo hi")
            .await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ExecutionFailure));
        assert!(outcome.text().contains("working directory"));
    }

    #[tokio::test]
    async fn test_python_print() {
        if !has("python3") && !has("python") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(dir.path()).execute(CodeLanguage::Python, "print('hi')").await;
        assert_eq!(outcome, Outcome::completed("hi\n"));
    }

    #[tokio::test]
    async fn test_python_class_in_restricted_profile() {
        if !has("python3") && !has("python") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let code = "class Point:\n    def __init__(self, x):\n        self.x = x\nprint(Point(3).x)";
        let outcome = engine(dir.path()).execute(CodeLanguage::Python, code).await;
        assert_eq!(outcome, Outcome::completed("3\n"));
    }

    #[tokio::test]
    async fn test_python_silent_snippet() {
        if !has("python3") && !has("python") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(dir.path()).execute(CodeLanguage::Python, "x = 1").await;
        assert_eq!(outcome.text(), "Code executed successfully");
    }

    #[tokio::test]
    async fn test_python_restricted_profile_blocks_os() {
        if !has("python3") && !has("python") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(dir.path())
            .execute(CodeLanguage::Python, "open('/etc/hostname').read()")
            .await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ExecutionFailure));
        assert!(outcome.text().starts_with("Python error:"));
        assert!(outcome.text().contains("NameError"));
    }

    #[tokio::test]
    async fn test_python_system_profile_when_idioms_present() {
        if !has("python3") && !has("python") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let code = "import subprocess\nprint(subprocess.run(['echo', 'sys'], capture_output=True, text=True).stdout.strip())";
        let outcome = engine(dir.path()).execute(CodeLanguage::Python, code).await;
        assert_eq!(outcome.text(), "sys\n");
    }

    #[tokio::test]
    async fn test_python_timeout() {
        if !has("python3") && !has("python") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let settings = EngineSettings::default().with_default_timeout(Duration::from_millis(500));
        let engine = CodeExecutionEngine::new(dir.path(), settings);
        let outcome = engine.execute(CodeLanguage::Python, "while True:\n    pass").await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ExecutionTimeout));
        assert!(outcome.text().starts_with("Python command timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bash_output_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());

        let outcome = engine.execute(CodeLanguage::Bash, "echo out; echo warn >&2").await;
        assert_eq!(outcome.text(), "out\nSTDERR:\nwarn");

        let silent = engine.execute(CodeLanguage::Shell, "true").await;
        assert_eq!(silent.text(), "Shell code executed successfully (no output)");

        let failed = engine.execute(CodeLanguage::Bash, "echo bad >&2; exit 2").await;
        assert_eq!(failed.text(), "Bash error: bad");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("here.txt"), "").unwrap();
        let outcome = engine(dir.path()).execute(CodeLanguage::Shell, "ls").await;
        assert_eq!(outcome.text(), "here.txt");
    }

    #[tokio::test]
    async fn test_javascript_missing_node() {
        if has("node") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(dir.path())
            .execute(CodeLanguage::JavaScript, "console.log(1)")
            .await;
        assert_eq!(
            outcome.text(),
            "JavaScript execution requires Node.js to be installed (node not found in PATH)"
        );
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_cmd_only_on_windows() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = engine(dir.path()).execute(CodeLanguage::Cmd, "dir").await;
        assert_eq!(outcome.text(), "CMD execution is only available on Windows");
    }

    #[test]
    fn test_language_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        assert_eq!(
            engine.language_for(&ToolCall::new("run_bash")),
            Some(CodeLanguage::Bash)
        );
        assert_eq!(
            engine.language_for(&ToolCall::new("execute_code")),
            Some(CodeLanguage::Python)
        );
        assert_eq!(
            engine.language_for(&ToolCall::new("execute_code").with_arg("language", "js")),
            Some(CodeLanguage::JavaScript)
        );
        assert_eq!(
            engine.language_for(&ToolCall::new("execute_code").with_arg("language", "cobol")),
            None
        );
    }

    #[tokio::test]
    async fn test_unsupported_language_faults() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let call = ToolCall::new("run_code").with_arg("language", "cobol").with_arg("code", "x");
        assert!(engine.resolve(&call).await.is_err());
    }
}
