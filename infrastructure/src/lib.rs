//! Infrastructure layer for tool-dispatch
//!
//! This crate contains the adapters behind the dispatcher's strategies:
//! process spawning, code execution, system introspection, raw commands,
//! HTTP, the workspace file manager, the JSONL dispatch log and
//! configuration file loading. [`EngineBuilder`] wires them together.
//!
//! # Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `system-metrics` | process/disk/memory/cpu/network actions via `sysinfo` |
//! | `html-parser` | CSS-selector scraping via `scraper` |
//! | `scripting` | in-process Lua via `mlua` |

pub mod command;
pub mod config;
pub mod engine;
pub mod execution;
pub mod files;
pub mod logging;
pub mod system;
pub mod web;

// Re-export commonly used types
pub use command::RawCommandResolver;
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use engine::EngineBuilder;
pub use execution::CodeExecutionEngine;
pub use files::{WorkspaceFileManager, confine_to_workspace};
pub use logging::JsonlDispatchLogger;
pub use system::SystemIntrospectionResolver;
pub use web::NetworkResolver;
