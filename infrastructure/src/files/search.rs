//! Keyword search over file names and contents

use std::fs;
use std::path::Path;

use glob::glob;
use regex::RegexBuilder;

/// Maximum number of hits reported
const MAX_RESULTS: usize = 200;

/// Files above this size are matched by name only.
const MAX_GREP_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Case-insensitive search for `keyword` under `base`.
///
/// File names are matched first, then file contents line by line. Paths are
/// reported relative to `root`.
pub fn search_workspace(root: &Path, base: &Path, keyword: &str) -> String {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return "Missing required argument: keyword".to_string();
    }

    let regex = match RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()
    {
        Ok(r) => r,
        Err(e) => return format!("Invalid search keyword: {}", e),
    };

    let files: Vec<_> = if base.is_file() {
        vec![base.to_path_buf()]
    } else {
        let pattern = format!("{}/**/*", glob::Pattern::escape(&base.display().to_string()));
        match glob(&pattern) {
            Ok(paths) => {
                let mut found: Vec<_> = paths.flatten().filter(|p| p.is_file()).collect();
                found.sort();
                found
            }
            Err(e) => return format!("Invalid search path: {}", e),
        }
    };

    let relative = |path: &Path| {
        path.strip_prefix(root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    };

    let mut results = Vec::new();
    for file in &files {
        if results.len() >= MAX_RESULTS {
            break;
        }
        let display = relative(file);
        if file
            .file_name()
            .is_some_and(|name| regex.is_match(&name.to_string_lossy()))
        {
            results.push(format!("{} (name match)", display));
        }

        if fs::metadata(file).is_ok_and(|m| m.len() > MAX_GREP_FILE_SIZE) {
            continue;
        }
        let Ok(content) = fs::read_to_string(file) else {
            continue;
        };
        for (line_num, line) in content.lines().enumerate() {
            if results.len() >= MAX_RESULTS {
                break;
            }
            if regex.is_match(line) {
                results.push(format!("{}:{}: {}", display, line_num + 1, line.trim()));
            }
        }
    }

    if results.is_empty() {
        return format!("No matches found for '{}'", keyword);
    }
    let mut output = results.join("\n");
    if results.len() >= MAX_RESULTS {
        output.push_str(&format!("\n... (limited to {} matches)", MAX_RESULTS));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_name_and_content_matches() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src").join("config.rs"), "fn load() {}\n").unwrap();
        fs::write(root.join("notes.txt"), "todo\nLoad the CONFIG first\n").unwrap();

        let output = search_workspace(&root, &root, "config");
        assert!(output.contains("notes.txt:2: Load the CONFIG first"));
        assert!(output.contains("config.rs (name match)"));
    }

    #[test]
    fn test_keyword_is_literal() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("a.txt"), "price (usd)\nprice usd\n").unwrap();
        let output = search_workspace(&root, &root, "(usd)");
        assert_eq!(output, "a.txt:1: price (usd)");
    }

    #[test]
    fn test_no_matches() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("a.txt"), "nothing here").unwrap();
        assert_eq!(search_workspace(&root, &root, "zebra"), "No matches found for 'zebra'");
    }
}
