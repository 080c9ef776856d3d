//! File capability port
//!
//! The file manager is a collaborator, not part of the engine. The
//! dispatcher works identically with it absent; strategies that need it
//! report a graceful failure or decline the call.

use std::path::PathBuf;

use dispatch_domain::tool::Arguments;

/// Port for workspace-confined file operations.
///
/// Every path is interpreted relative to the workspace root, and every
/// method returns a human-readable message (success or failure alike).
/// Implementations live in the infrastructure layer.
pub trait FileCapability: Send + Sync {
    fn create_file(&self, name: &str, content: &str) -> String;

    fn read_file(&self, name: &str) -> String;

    fn write_to_file(&self, name: &str, content: &str) -> String;

    fn delete_file(&self, name: &str) -> String;

    /// List a directory (the workspace root when `path` is `None`).
    fn list_files(&self, path: Option<&str>) -> String;

    fn copy_file(&self, source: &str, destination: &str) -> String;

    fn move_file(&self, source: &str, destination: &str) -> String;

    /// Search file names and contents for `keyword` below `path`.
    fn search_files(&self, keyword: &str, path: Option<&str>) -> String;

    /// Resolve a workspace-relative name to an absolute path inside the
    /// workspace, or explain why it escapes it.
    fn resolve_path(&self, name: &str) -> Result<PathBuf, String>;

    /// Extension point for operations outside the fixed table.
    ///
    /// Returns `None` when `name` is not an operation this collaborator
    /// knows; the generic fallback then declines the call.
    fn invoke(&self, _name: &str, _arguments: &Arguments) -> Option<String> {
        None
    }
}
