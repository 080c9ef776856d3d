//! Application-level configuration.

pub mod engine_settings;

pub use engine_settings::{
    EngineSettings, MAX_COMMAND_TIMEOUT, MAX_DOWNLOAD_TIMEOUT, NetworkSettings,
};
