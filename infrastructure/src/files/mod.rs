//! Workspace file manager
//!
//! Reference [`FileCapability`] adapter. Every name is resolved through
//! [`confine_to_workspace`] before touching the filesystem, so a call can
//! never read or write outside the workspace root.

mod search;

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use dispatch_application::ports::file_capability::FileCapability;
use dispatch_domain::tool::Arguments;
use tracing::debug;

pub use search::search_workspace;

/// Files larger than this are not read into a result.
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

const NAME_KEYS: &[&str] = &["file_name", "filename", "path", "file", "name", "directory"];
const CONTENT_KEYS: &[&str] = &["content", "text", "data"];

/// Resolve `name` against `root`, rejecting anything that escapes it.
///
/// Resolution is lexical first (`..` may not climb above the root). The
/// deepest existing part of the result is then canonicalized, so a symlink
/// anywhere along the path that leads outside the workspace is refused,
/// including a dangling one.
pub fn confine_to_workspace(root: &Path, name: &str) -> Result<PathBuf, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Path must not be empty".to_string());
    }

    let denied = || format!("Access denied: '{}' is outside the workspace", trimmed);
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let candidate = Path::new(trimmed);

    let relative = if candidate.is_absolute() {
        let absolute = candidate
            .canonicalize()
            .unwrap_or_else(|_| candidate.to_path_buf());
        absolute.strip_prefix(&root).map_err(|_| denied())?.to_path_buf()
    } else {
        candidate.to_path_buf()
    };

    let mut resolved = root.clone();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return Err(denied());
                }
                resolved.pop();
                depth -= 1;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return Err(denied()),
        }
    }

    // The deepest entry that exists (a dangling link counts) decides where a
    // write would land, so its real location must stay under the root.
    let existing = resolved
        .ancestors()
        .find(|ancestor| fs::symlink_metadata(ancestor).is_ok());
    if let Some(existing) = existing {
        match existing.canonicalize() {
            Ok(real) if real.starts_with(&root) => {}
            _ => return Err(denied()),
        }
    }

    Ok(resolved)
}

fn first_arg<'a>(arguments: &'a Arguments, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| arguments.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.trim().is_empty())
}

/// File manager confined to a single workspace directory.
#[derive(Debug, Clone)]
pub struct WorkspaceFileManager {
    root: PathBuf,
}

impl WorkspaceFileManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn display_path(&self, path: &Path) -> String {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        path.strip_prefix(&root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }

    fn ensure_parent(path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create parent directories: {}", e))?;
        }
        Ok(())
    }

    fn file_info(&self, name: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => return format!("File '{}' not found", name),
        };
        let kind = if metadata.is_dir() { "directory" } else { "file" };
        let modified = metadata
            .modified()
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format!(
            "Path: {}\nType: {}\nSize: {} bytes\nModified: {}\nRead-only: {}",
            self.display_path(&path),
            kind,
            metadata.len(),
            modified,
            metadata.permissions().readonly()
        )
    }

    fn append_to_file(&self, name: &str, content: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if let Err(e) = Self::ensure_parent(&path) {
            return e;
        }
        let appended = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .and_then(|mut file| file.write_all(content.as_bytes()));
        match appended {
            Ok(()) => format!("Appended {} bytes to '{}'", content.len(), name),
            Err(e) => format!("Failed to append to '{}': {}", name, e),
        }
    }

    fn create_directory(&self, name: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if path.is_dir() {
            return format!("Directory '{}' already exists", name);
        }
        match fs::create_dir_all(&path) {
            Ok(()) => format!("Created directory '{}'", name),
            Err(e) => format!("Failed to create directory '{}': {}", name, e),
        }
    }

    fn file_exists(&self, name: &str) -> String {
        match self.resolve_path(name) {
            Ok(path) if path.exists() => format!("'{}' exists", name),
            Ok(_) => format!("'{}' does not exist", name),
            Err(e) => e,
        }
    }
}

impl FileCapability for WorkspaceFileManager {
    fn create_file(&self, name: &str, content: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if path.exists() {
            return format!("File '{}' already exists", name);
        }
        if let Err(e) = Self::ensure_parent(&path) {
            return e;
        }
        match fs::write(&path, content) {
            Ok(()) => {
                debug!(path = %path.display(), "Created file");
                format!("Created file '{}'", name)
            }
            Err(e) => format!("Failed to create '{}': {}", name, e),
        }
    }

    fn read_file(&self, name: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if !path.exists() {
            return format!("File '{}' not found", name);
        }
        if !path.is_file() {
            return format!("'{}' is not a file", name);
        }
        match fs::metadata(&path) {
            Ok(m) if m.len() > MAX_READ_SIZE => {
                return format!(
                    "File too large ({} bytes). Maximum size is {} bytes",
                    m.len(),
                    MAX_READ_SIZE
                );
            }
            Ok(_) => {}
            Err(e) => return format!("Failed to get file metadata: {}", e),
        }
        match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied: {}", name)
            }
            Err(e) => format!("Failed to read '{}': {}", name, e),
        }
    }

    fn write_to_file(&self, name: &str, content: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if path.is_dir() {
            return format!("'{}' is a directory", name);
        }
        if let Err(e) = Self::ensure_parent(&path) {
            return e;
        }
        match fs::write(&path, content) {
            Ok(()) => format!("Wrote {} bytes to '{}'", content.len(), name),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied: {}", name)
            }
            Err(e) => format!("Failed to write '{}': {}", name, e),
        }
    }

    fn delete_file(&self, name: &str) -> String {
        let path = match self.resolve_path(name) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if path == self.root.canonicalize().unwrap_or_else(|_| self.root.clone()) {
            return "Refusing to delete the workspace root".to_string();
        }
        if !path.exists() {
            return format!("File '{}' not found", name);
        }
        let removed = if path.is_dir() {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        match removed {
            Ok(()) => format!("Deleted '{}'", name),
            Err(e) if path.is_dir() => {
                format!("Failed to delete directory '{}' (must be empty): {}", name, e)
            }
            Err(e) => format!("Failed to delete '{}': {}", name, e),
        }
    }

    fn list_files(&self, path: Option<&str>) -> String {
        let label = path.unwrap_or(".");
        let dir = match self.resolve_path(label) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if !dir.is_dir() {
            return format!("Directory '{}' not found", label);
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => return format!("Failed to list '{}': {}", label, e),
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if entry.path().is_dir() {
                    format!("{}/", name)
                } else {
                    name
                }
            })
            .collect();
        if names.is_empty() {
            return format!("Directory '{}' is empty", label);
        }
        names.sort();
        names.join("\n")
    }

    fn copy_file(&self, source: &str, destination: &str) -> String {
        let (from, to) = match (self.resolve_path(source), self.resolve_path(destination)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(e), _) | (_, Err(e)) => return e,
        };
        if !from.is_file() {
            return format!("File '{}' not found", source);
        }
        let to = if to.is_dir() {
            match from.file_name() {
                Some(file_name) => to.join(file_name),
                None => to,
            }
        } else {
            to
        };
        if let Err(e) = Self::ensure_parent(&to) {
            return e;
        }
        match fs::copy(&from, &to) {
            Ok(bytes) => format!("Copied '{}' to '{}' ({} bytes)", source, destination, bytes),
            Err(e) => format!("Failed to copy '{}': {}", source, e),
        }
    }

    fn move_file(&self, source: &str, destination: &str) -> String {
        let (from, to) = match (self.resolve_path(source), self.resolve_path(destination)) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(e), _) | (_, Err(e)) => return e,
        };
        if !from.exists() {
            return format!("File '{}' not found", source);
        }
        let to = if to.is_dir() {
            match from.file_name() {
                Some(file_name) => to.join(file_name),
                None => to,
            }
        } else {
            to
        };
        if let Err(e) = Self::ensure_parent(&to) {
            return e;
        }
        match fs::rename(&from, &to) {
            Ok(()) => format!("Moved '{}' to '{}'", source, destination),
            Err(_) if from.is_file() => match fs::copy(&from, &to).and_then(|_| fs::remove_file(&from)) {
                Ok(()) => format!("Moved '{}' to '{}'", source, destination),
                Err(e) => format!("Failed to move '{}': {}", source, e),
            },
            Err(e) => format!("Failed to move '{}': {}", source, e),
        }
    }

    fn search_files(&self, keyword: &str, path: Option<&str>) -> String {
        let base = match self.resolve_path(path.unwrap_or(".")) {
            Ok(p) => p,
            Err(e) => return e,
        };
        if !base.exists() {
            return format!("Directory '{}' not found", path.unwrap_or("."));
        }
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        search_workspace(&root, &base, keyword)
    }

    fn resolve_path(&self, name: &str) -> Result<PathBuf, String> {
        confine_to_workspace(&self.root, name)
    }

    fn invoke(&self, name: &str, arguments: &Arguments) -> Option<String> {
        let target = first_arg(arguments, NAME_KEYS);
        let missing = |arg: &str| format!("Missing required argument: {}", arg);
        let text = match name.trim().to_lowercase().as_str() {
            "file_info" | "get_file_info" | "stat" => match target {
                Some(t) => self.file_info(t),
                None => missing("path"),
            },
            "append_to_file" | "append_file" | "append" => {
                match (target, first_arg(arguments, CONTENT_KEYS)) {
                    (Some(t), Some(content)) => self.append_to_file(t, content),
                    (None, _) => missing("path"),
                    (_, None) => missing("content"),
                }
            }
            "create_directory" | "mkdir" | "make_directory" | "create_folder" => match target {
                Some(t) => self.create_directory(t),
                None => missing("path"),
            },
            "file_exists" | "exists" | "path_exists" => match target {
                Some(t) => self.file_exists(t),
                None => missing("path"),
            },
            _ => return None,
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_confine_rejects_parent_escape() {
        let dir = tempdir().unwrap();
        let err = confine_to_workspace(dir.path(), "../secret.txt").unwrap_err();
        assert!(err.contains("outside the workspace"));
        assert!(confine_to_workspace(dir.path(), "a/../../b").is_err());
    }

    #[test]
    fn test_confine_allows_inner_parent_segments() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let resolved = confine_to_workspace(dir.path(), "a/b/../c.txt").unwrap();
        assert_eq!(resolved, root.join("a").join("c.txt"));
    }

    #[test]
    fn test_confine_absolute_paths() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let inside = root.join("x.txt");
        assert_eq!(
            confine_to_workspace(dir.path(), inside.to_str().unwrap()).unwrap(),
            inside
        );
        let other = tempdir().unwrap();
        let outside = other.path().join("y.txt");
        assert!(confine_to_workspace(dir.path(), outside.to_str().unwrap()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_confine_rejects_symlink_escape() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        std::os::unix::fs::symlink(other.path(), dir.path().join("link")).unwrap();
        assert!(confine_to_workspace(dir.path(), "link").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_confine_rejects_new_file_under_symlinked_dir() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        std::os::unix::fs::symlink(other.path(), dir.path().join("link")).unwrap();
        assert!(confine_to_workspace(dir.path(), "link/evil.txt").is_err());
        assert!(confine_to_workspace(dir.path(), "link/deeper/evil.txt").is_err());

        let files = WorkspaceFileManager::new(dir.path());
        let message = files.create_file("link/evil.txt", "x");
        assert!(message.contains("outside the workspace"));
        assert!(!other.path().join("evil.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_confine_rejects_dangling_symlink() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let target = other.path().join("target.txt");
        std::os::unix::fs::symlink(&target, dir.path().join("dl")).unwrap();
        assert!(confine_to_workspace(dir.path(), "dl").is_err());

        let files = WorkspaceFileManager::new(dir.path());
        files.write_to_file("dl", "x");
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_confine_allows_symlink_inside_workspace() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), dir.path().join("alias")).unwrap();
        assert!(confine_to_workspace(dir.path(), "alias/new.txt").is_ok());
    }

    #[test]
    fn test_create_read_write_delete() {
        let dir = tempdir().unwrap();
        let files = WorkspaceFileManager::new(dir.path());

        assert_eq!(files.create_file("notes/a.txt", "hello"), "Created file 'notes/a.txt'");
        assert_eq!(files.create_file("notes/a.txt", "again"), "File 'notes/a.txt' already exists");
        assert_eq!(files.read_file("notes/a.txt"), "hello");
        assert_eq!(files.write_to_file("notes/a.txt", "bye"), "Wrote 3 bytes to 'notes/a.txt'");
        assert_eq!(files.read_file("notes/a.txt"), "bye");
        assert_eq!(files.delete_file("notes/a.txt"), "Deleted 'notes/a.txt'");
        assert_eq!(files.read_file("notes/a.txt"), "File 'notes/a.txt' not found");
    }

    #[test]
    fn test_read_directory_is_rejected() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let files = WorkspaceFileManager::new(dir.path());
        assert_eq!(files.read_file("sub"), "'sub' is not a file");
    }

    #[test]
    fn test_list_files_sorted_with_dir_marker() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let files = WorkspaceFileManager::new(dir.path());
        assert_eq!(files.list_files(None), "a.txt\nb.txt\nsrc/");
        assert_eq!(files.list_files(Some("src")), "Directory 'src' is empty");
        assert_eq!(files.list_files(Some("nope")), "Directory 'nope' not found");
    }

    #[test]
    fn test_copy_and_move() {
        let dir = tempdir().unwrap();
        let files = WorkspaceFileManager::new(dir.path());
        files.create_file("a.txt", "data");

        assert!(files.copy_file("a.txt", "b.txt").starts_with("Copied 'a.txt' to 'b.txt'"));
        assert_eq!(files.read_file("b.txt"), "data");

        assert_eq!(files.move_file("b.txt", "out/c.txt"), "Moved 'b.txt' to 'out/c.txt'");
        assert_eq!(files.read_file("out/c.txt"), "data");
        assert!(!dir.path().join("b.txt").exists());

        fs::create_dir(dir.path().join("into")).unwrap();
        files.copy_file("a.txt", "into");
        assert!(dir.path().join("into").join("a.txt").exists());
    }

    #[test]
    fn test_operations_refuse_escape() {
        let dir = tempdir().unwrap();
        let files = WorkspaceFileManager::new(dir.path());
        assert!(files.read_file("../etc/passwd").contains("outside the workspace"));
        assert!(files.copy_file("../x", "y").contains("outside the workspace"));
    }

    #[test]
    fn test_invoke_extension_operations() {
        let dir = tempdir().unwrap();
        let files = WorkspaceFileManager::new(dir.path());

        assert_eq!(
            files.invoke("create_directory", &args(json!({"path": "logs"}))).unwrap(),
            "Created directory 'logs'"
        );
        assert_eq!(
            files.invoke("append_to_file", &args(json!({"path": "logs/a.log", "content": "x\n"}))).unwrap(),
            "Appended 2 bytes to 'logs/a.log'"
        );
        files.invoke("append_to_file", &args(json!({"path": "logs/a.log", "text": "y\n"})));
        assert_eq!(files.read_file("logs/a.log"), "x\ny\n");

        assert_eq!(
            files.invoke("file_exists", &args(json!({"filename": "logs/a.log"}))).unwrap(),
            "'logs/a.log' exists"
        );
        assert_eq!(
            files.invoke("file_exists", &args(json!({"filename": "missing"}))).unwrap(),
            "'missing' does not exist"
        );

        let info = files.invoke("file_info", &args(json!({"path": "logs/a.log"}))).unwrap();
        assert!(info.contains("Type: file"));
        assert!(info.contains("Size: 4 bytes"));

        assert_eq!(
            files.invoke("append_to_file", &args(json!({"path": "a"}))).unwrap(),
            "Missing required argument: content"
        );
        assert!(files.invoke("compress_file", &args(json!({"path": "a"}))).is_none());
    }
}
