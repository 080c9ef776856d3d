//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "tool-dispatch";
const PROJECT_FILES: [&str; 2] = ["dispatch.toml", ".dispatch.toml"];
const ENV_PREFIX: &str = "TOOL_DISPATCH_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TOOL_DISPATCH_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./dispatch.toml` or `./.dispatch.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/tool-dispatch/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        if let Some(path) = config_path
            && !path.exists()
        {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();

        Self::figment(global.as_deref(), project.as_deref(), config_path)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Merge file sources over the defaults, lowest priority first.
    fn figment(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        [global, project, explicit]
            .into_iter()
            .flatten()
            .fold(
                Figment::new().merge(Serialized::defaults(FileConfig::default())),
                |figment, path| figment.merge(Toml::file(path)),
            )
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/tool-dispatch/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&Path>) {
        println!("Configuration sources (in priority order):");
        println!("  [  ENV] Environment: {}*", ENV_PREFIX);

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{:>5}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./dispatch.toml or ./.dispatch.toml");
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", mark, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> FileConfig {
        ConfigLoader::figment(global, project, explicit).extract().unwrap()
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.engine.workspace_root.is_none());
        assert!(config.sandbox.allow_system_profile);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.to_string_lossy().contains("tool-dispatch"));
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("dispatch.toml");
        std::fs::write(
            &global,
            "[execution]\ndefault_timeout_secs = 20\nmax_output_bytes = 100\n",
        )
        .unwrap();
        std::fs::write(&project, "[execution]\ndefault_timeout_secs = 30\n").unwrap();

        let config = extract(Some(&global), Some(&project), None);
        assert_eq!(config.execution.default_timeout_secs, 30);
        assert_eq!(config.execution.max_output_bytes, 100);
        assert_eq!(config.execution.powershell_timeout_secs, 15);
    }

    #[test]
    fn test_explicit_file_has_highest_file_priority() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("dispatch.toml");
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&project, "[sandbox]\nallow_system_profile = true\n").unwrap();
        std::fs::write(&explicit, "[sandbox]\nallow_system_profile = false\n").unwrap();

        let config = extract(None, Some(&project), Some(&explicit));
        assert!(!config.sandbox.allow_system_profile);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ConfigLoader::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[execution]\ndefault_timeout_secs = \"soon\"\n").unwrap();
        assert!(ConfigLoader::figment(None, None, Some(&path)).extract::<FileConfig>().is_err());
    }
}
