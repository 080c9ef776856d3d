//! Configuration file loading for tool-dispatch
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOL_DISPATCH_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./dispatch.toml` or `./.dispatch.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tool-dispatch/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, FileConfig, FileEngineConfig, FileExecutionConfig, FileLoggingConfig,
    FileNetworkConfig, FileSandboxConfig, Severity,
};
pub use loader::{ConfigError, ConfigLoader};
