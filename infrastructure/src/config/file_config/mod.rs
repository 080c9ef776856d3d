//! Raw TOML configuration data types
//!
//! These structs mirror the config file exactly. [`FileConfig::validate`]
//! reports problems and [`FileConfig::to_engine_settings`] converts the raw
//! values, falling back to defaults wherever a value is unusable.

mod execution;
mod logging;
mod network;

pub use execution::{FileEngineConfig, FileExecutionConfig, FileSandboxConfig};
pub use logging::FileLoggingConfig;
pub use network::FileNetworkConfig;

use dispatch_application::config::{EngineSettings, MAX_DOWNLOAD_TIMEOUT, NetworkSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The value is replaced by a default or clamped
    Warning,
    /// The value is unusable
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single problem found in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    /// Dotted key, e.g. `execution.default_timeout_secs`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub engine: FileEngineConfig,
    pub execution: FileExecutionConfig,
    pub sandbox: FileSandboxConfig,
    pub network: FileNetworkConfig,
    pub logging: FileLoggingConfig,
}

fn secs_or(value: u64, fallback: Duration) -> Duration {
    if value == 0 {
        fallback
    } else {
        Duration::from_secs(value)
    }
}

impl FileConfig {
    /// Validate the configuration, returning every detected issue.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        let zero_checks = [
            ("execution.default_timeout_secs", self.execution.default_timeout_secs),
            ("execution.powershell_timeout_secs", self.execution.powershell_timeout_secs),
            ("network.timeout_secs", self.network.timeout_secs),
            ("network.download_timeout_secs", self.network.download_timeout_secs),
        ];
        for (field, value) in zero_checks {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    field,
                    format!("{field} must be greater than 0, using the default"),
                ));
            }
        }

        if self.network.download_timeout_secs > MAX_DOWNLOAD_TIMEOUT.as_secs() {
            issues.push(ConfigIssue::warning(
                "network.download_timeout_secs",
                format!(
                    "network.download_timeout_secs = {} exceeds the {}s limit and is clamped",
                    self.network.download_timeout_secs,
                    MAX_DOWNLOAD_TIMEOUT.as_secs()
                ),
            ));
        }

        if self.execution.max_output_bytes == 0 {
            issues.push(ConfigIssue::error(
                "execution.max_output_bytes",
                "execution.max_output_bytes must be greater than 0, using the default",
            ));
        }

        if self
            .execution
            .python_interpreters
            .iter()
            .all(|name| name.trim().is_empty())
        {
            issues.push(ConfigIssue::warning(
                "execution.python_interpreters",
                "execution.python_interpreters is empty, using python3 and python",
            ));
        }

        if let Some(root) = &self.engine.workspace_root
            && !root.is_dir()
        {
            issues.push(ConfigIssue::error(
                "engine.workspace_root",
                format!("engine.workspace_root '{}' is not a directory", root.display()),
            ));
        }

        issues
    }

    /// Convert to the engine's runtime settings.
    pub fn to_engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        let network_defaults = NetworkSettings::default();

        let interpreters: Vec<String> = self
            .execution
            .python_interpreters
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let network = NetworkSettings {
            timeout: secs_or(self.network.timeout_secs, network_defaults.timeout),
            download_timeout: secs_or(
                self.network.download_timeout_secs,
                network_defaults.download_timeout,
            )
            .min(MAX_DOWNLOAD_TIMEOUT),
            preview_chars: self.network.preview_chars,
            scrape_chars: self.network.scrape_chars,
            user_agent: self
                .network
                .user_agent
                .clone()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(network_defaults.user_agent),
        };

        EngineSettings {
            default_timeout: secs_or(self.execution.default_timeout_secs, defaults.default_timeout),
            shell_host_timeout: secs_or(
                self.execution.powershell_timeout_secs,
                defaults.shell_host_timeout,
            ),
            python_interpreters: if interpreters.is_empty() {
                defaults.python_interpreters
            } else {
                interpreters
            },
            max_output_bytes: if self.execution.max_output_bytes == 0 {
                defaults.max_output_bytes
            } else {
                self.execution.max_output_bytes
            },
            allow_system_profile: self.sandbox.allow_system_profile,
            network,
        }
    }
}
