//! `[network]` section

use serde::{Deserialize, Serialize};

/// Raw network configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNetworkConfig {
    pub timeout_secs: u64,
    /// Clamped to 60
    pub download_timeout_secs: u64,
    pub preview_chars: usize,
    pub scrape_chars: usize,
    pub user_agent: Option<String>,
}

impl Default for FileNetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            download_timeout_secs: 60,
            preview_chars: 500,
            scrape_chars: 2000,
            user_agent: None,
        }
    }
}
