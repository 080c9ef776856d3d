//! Engine settings: timeouts, interpreter choice, sandbox policy and
//! network limits.
//!
//! [`EngineSettings`] is the application-level view of configuration. The
//! infrastructure config loader produces it from TOML/env; tests build it
//! with the `with_*` methods.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for any single download.
pub const MAX_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for a raw command's caller-supplied timeout.
pub const MAX_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Network resolver limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Default GET/POST timeout when the call gives none.
    pub timeout: Duration,
    pub download_timeout: Duration,
    /// Characters of body shown in GET/POST results.
    pub preview_chars: usize,
    /// Characters of text kept by scrape.
    pub scrape_chars: usize,
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            download_timeout: MAX_DOWNLOAD_TIMEOUT,
            preview_chars: 500,
            scrape_chars: 2000,
            user_agent: format!("tool-dispatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Execution parameters shared by every strategy.
///
/// | Setting | Default |
/// |---------|---------|
/// | `default_timeout` | 10s |
/// | `shell_host_timeout` (powershell, cmd, ping) | 15s |
/// | `python_interpreters` | `python3`, `python` |
/// | `allow_system_profile` | true |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub default_timeout: Duration,
    pub shell_host_timeout: Duration,
    /// Interpreter names tried in order for python snippets.
    pub python_interpreters: Vec<String>,
    /// Captured output beyond this many bytes is cut.
    pub max_output_bytes: usize,
    /// Run python snippets with system idioms under the system profile.
    pub allow_system_profile: bool,
    pub network: NetworkSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(10),
            shell_host_timeout: Duration::from_secs(15),
            python_interpreters: vec!["python3".to_string(), "python".to_string()],
            max_output_bytes: 1024 * 1024,
            allow_system_profile: true,
            network: NetworkSettings::default(),
        }
    }
}

impl EngineSettings {
    // ==================== Builder Methods ====================

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_shell_host_timeout(mut self, timeout: Duration) -> Self {
        self.shell_host_timeout = timeout;
        self
    }

    pub fn with_python_interpreters(mut self, interpreters: Vec<String>) -> Self {
        self.python_interpreters = interpreters;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    pub fn with_allow_system_profile(mut self, allow: bool) -> Self {
        self.allow_system_profile = allow;
        self
    }

    pub fn with_network(mut self, network: NetworkSettings) -> Self {
        self.network = network;
        self
    }

    /// Clamp a caller-supplied raw command timeout.
    pub fn command_timeout(&self, requested_secs: Option<i64>) -> Duration {
        match requested_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64).min(MAX_COMMAND_TIMEOUT),
            _ => self.default_timeout,
        }
    }

    /// Clamp a caller-supplied request timeout.
    pub fn request_timeout(&self, requested_secs: Option<f64>) -> Duration {
        match requested_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                Duration::from_secs_f64(secs).min(MAX_DOWNLOAD_TIMEOUT)
            }
            _ => self.network.timeout,
        }
    }
}
