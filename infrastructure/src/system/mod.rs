//! System introspection resolver
//!
//! Process listing and control, resource snapshots, network interfaces,
//! ping, environment variables and PATH. Metrics-backed actions need the
//! `system-metrics` feature.

pub mod environment;
#[cfg(feature = "system-metrics")]
pub mod metrics;
#[cfg(feature = "system-metrics")]
pub mod process_control;

use std::path::PathBuf;

use async_trait::async_trait;
use dispatch_application::config::EngineSettings;
use dispatch_application::ports::strategy::{ResolverStrategy, StrategyFault};
use dispatch_domain::command::Platform;
use dispatch_domain::tool::{Outcome, ResolverOutcome, SystemAction, ToolCall};
use serde_json::Value;
use tracing::debug;

const DEFAULT_PROCESS_LIMIT: usize = 10;
const PID_KEYS: &[&str] = &["pid", "process_id", "id"];
const HOST_KEYS: &[&str] = &["host", "hostname", "target", "address"];
const VARIABLE_KEYS: &[&str] = &["name", "variable", "var", "key"];

/// Validate the PID argument: a positive integer, given as number or string.
pub fn parse_pid(call: &ToolCall) -> Result<u32, Outcome> {
    let raw = PID_KEYS.iter().find_map(|key| call.arguments.get(*key));
    let display = match raw {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "(missing)".to_string(),
    };

    PID_KEYS
        .iter()
        .find_map(|key| call.get_i64(key))
        .filter(|pid| *pid > 0)
        .and_then(|pid| u32::try_from(pid).ok())
        .ok_or_else(|| Outcome::invalid_argument(format!("Invalid PID: {}", display)))
}

pub struct SystemIntrospectionResolver {
    workspace_root: PathBuf,
    settings: EngineSettings,
    platform: Platform,
}

impl SystemIntrospectionResolver {
    pub fn new(workspace_root: impl Into<PathBuf>, settings: EngineSettings) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            settings,
            platform: Platform::host(),
        }
    }

    pub async fn run(&self, action: SystemAction, call: &ToolCall) -> Outcome {
        debug!(action = action.display_name(), "System action");
        match action {
            SystemAction::EnvironmentVariables => {
                environment::environment_variables(call.first_string(VARIABLE_KEYS))
            }
            SystemAction::PathInfo => environment::path_info(),
            SystemAction::Ping => match call.first_string(HOST_KEYS) {
                Some(host) => {
                    environment::ping(
                        host,
                        call.get_i64("count"),
                        self.settings.shell_host_timeout,
                        &self.workspace_root,
                        self.platform,
                    )
                    .await
                }
                None => Outcome::invalid_argument("Missing required argument: host"),
            },
            _ => self.run_metrics(action, call).await,
        }
    }

    #[cfg(feature = "system-metrics")]
    async fn run_metrics(&self, action: SystemAction, call: &ToolCall) -> Outcome {
        let pid = match action {
            SystemAction::KillProcess | SystemAction::ProcessInfo => match parse_pid(call) {
                Ok(pid) => pid,
                Err(outcome) => return outcome,
            },
            _ => 0,
        };
        let limit = call
            .get_i64("limit")
            .or_else(|| call.get_i64("count"))
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_PROCESS_LIMIT);

        let task = tokio::task::spawn_blocking(move || match action {
            SystemAction::SystemInfo => metrics::system_info(),
            SystemAction::ListProcesses => metrics::list_processes(limit),
            SystemAction::KillProcess => metrics::kill_process(pid),
            SystemAction::ProcessInfo => metrics::process_info(pid),
            SystemAction::DiskUsage => metrics::disk_usage(),
            SystemAction::MemoryUsage => metrics::memory_usage(),
            SystemAction::CpuUsage => metrics::cpu_usage(),
            SystemAction::NetworkInterfaces => metrics::network_interfaces(),
            SystemAction::Ping | SystemAction::EnvironmentVariables | SystemAction::PathInfo => {
                Outcome::execution_failure(format!("{} is not a metrics action", action.display_name()))
            }
        });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::execution_failure(format!(
                "{} failed: {}",
                action.display_name(),
                e
            )),
        }
    }

    #[cfg(not(feature = "system-metrics"))]
    async fn run_metrics(&self, action: SystemAction, call: &ToolCall) -> Outcome {
        if matches!(action, SystemAction::KillProcess | SystemAction::ProcessInfo)
            && let Err(outcome) = parse_pid(call)
        {
            return outcome;
        }
        Outcome::dependency_missing(format!(
            "{} requires the sysinfo library (enable the system-metrics feature)",
            action.display_name()
        ))
    }
}

#[async_trait]
impl ResolverStrategy for SystemIntrospectionResolver {
    fn name(&self) -> &'static str {
        "system"
    }

    fn applies(&self, call: &ToolCall) -> bool {
        SystemAction::from_alias(&call.name).is_some()
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        let action = SystemAction::from_alias(&call.name)
            .ok_or_else(|| StrategyFault::apply(self.name(), "not a system action"))?;
        Ok(self.run(action, call).await.into())
    }
}
