//! Raw system command fallback
//!
//! Claims `run_command`-style calls and runs the `command` text through the
//! host shell after translating POSIX idioms for the host platform.

use std::path::PathBuf;

use async_trait::async_trait;
use dispatch_application::config::EngineSettings;
use dispatch_application::ports::strategy::{ResolverStrategy, StrategyFault};
use dispatch_domain::command::{Platform, translate};
use dispatch_domain::tool::capability::is_raw_command_call;
use dispatch_domain::tool::{Outcome, ResolverOutcome, ToolCall};
use tracing::debug;

use crate::execution::{ProcessError, ProcessOutput, host_shell, run_process};

const COMMAND_KEYS: &[&str] = &["command", "cmd", "shell_command", "script"];

pub struct RawCommandResolver {
    workspace_root: PathBuf,
    settings: EngineSettings,
    platform: Platform,
}

fn render(output: ProcessOutput) -> String {
    let mut text = output.stdout.trim_end().to_string();
    if !output.stderr.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str("STDERR:\n");
        text.push_str(output.stderr.trim_end());
    }
    if !output.success {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&format!(
            "Exit code: {}",
            output
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "terminated by signal".to_string())
        ));
    }
    if text.is_empty() {
        "Command executed successfully (no output)".to_string()
    } else {
        text
    }
}

impl RawCommandResolver {
    pub fn new(workspace_root: impl Into<PathBuf>, settings: EngineSettings) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            settings,
            platform: Platform::host(),
        }
    }

    pub async fn run(&self, command: &str, timeout_secs: Option<i64>) -> Outcome {
        let translated = translate(command, self.platform);
        if translated != command {
            debug!(original = command, translated = %translated, "Translated command");
        }

        let Some(spec) = host_shell(&translated, &self.workspace_root) else {
            return Outcome::dependency_missing("No command shell found in PATH");
        };
        let spec = spec.with_timeout(self.settings.command_timeout(timeout_secs));

        match run_process(&spec, self.settings.max_output_bytes).await {
            Ok(output) => Outcome::completed(render(output)),
            Err(ProcessError::Timeout { timeout }) => Outcome::timeout(format!(
                "Command timed out after {}s: {}",
                timeout.as_secs(),
                command
            )),
            Err(e) => Outcome::execution_failure(format!("Command execution error: {}", e)),
        }
    }
}

#[async_trait]
impl ResolverStrategy for RawCommandResolver {
    fn name(&self) -> &'static str {
        "raw_command"
    }

    fn applies(&self, call: &ToolCall) -> bool {
        is_raw_command_call(call)
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        let Some(command) = call.first_string(COMMAND_KEYS) else {
            return Ok(Outcome::invalid_argument("Missing required argument: command").into());
        };
        let timeout = call.get_i64("timeout").or_else(|| call.get_i64("timeout_secs"));
        Ok(self.run(command, timeout).await.into())
    }
}
