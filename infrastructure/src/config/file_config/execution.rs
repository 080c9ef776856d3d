//! `[engine]`, `[execution]` and `[sandbox]` sections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw engine configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Directory all file and process operations are confined to
    /// (default: current directory)
    pub workspace_root: Option<PathBuf>,
}

/// Raw execution configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub default_timeout_secs: u64,
    /// Timeout for powershell, cmd and ping
    pub powershell_timeout_secs: u64,
    /// Interpreter names tried in order for python snippets
    pub python_interpreters: Vec<String>,
    pub max_output_bytes: usize,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 10,
            powershell_timeout_secs: 15,
            python_interpreters: vec!["python3".to_string(), "python".to_string()],
            max_output_bytes: 1024 * 1024,
        }
    }
}

/// Raw sandbox configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSandboxConfig {
    /// Run python snippets that use subprocess/os/pip under the wider
    /// system profile instead of failing them under the restricted one
    pub allow_system_profile: bool,
}

impl Default for FileSandboxConfig {
    fn default() -> Self {
        Self {
            allow_system_profile: true,
        }
    }
}
