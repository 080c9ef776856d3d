//! Alternative-name suggestions for unresolved tool calls.

use crate::tool::Arguments;

/// Returned when no heuristic matches. Never empty.
pub const NO_SUGGESTION: &str =
    "No similar tool found. Use one of the available capabilities listed above.";

/// Keyword groups in priority order: (name keywords, argument keys, entry point, hint).
const RULES: &[(&[&str], &[&str], &str, &str)] = &[
    (
        &["file", "read", "write", "dir", "folder"],
        &["path", "file", "filename", "directory", "content"],
        "file_operation",
        "read_file, write_to_file, list_files, search_files",
    ),
    (
        &["command", "run", "shell", "exec", "terminal"],
        &["command", "cmd"],
        "run_command",
        "run_command with a 'command' argument",
    ),
    (
        &["calc", "math", "compute", "sum"],
        &["expression", "expr"],
        "calculator",
        "calculator with an 'expression' argument",
    ),
    (
        &["code", "script", "python", "js"],
        &["code", "script", "language"],
        "execute_code",
        "execute_code with 'language' and 'code' arguments",
    ),
    (
        &["http", "url", "web", "fetch", "download"],
        &["url", "headers"],
        "http_get",
        "http_get, http_post, download_file, scrape_webpage",
    ),
    (
        &["process", "system", "cpu", "memory", "disk", "env"],
        &["pid", "host"],
        "system_info",
        "system_info, list_processes, disk_usage, memory_usage",
    ),
];

/// Keyword heuristic over the requested name, with argument keys as a tiebreak.
pub struct SuggestionEngine;

impl SuggestionEngine {
    pub fn suggest(name: &str, arguments: &Arguments) -> String {
        let lowered = name.to_lowercase();

        let by_name = RULES
            .iter()
            .find(|(keywords, _, _, _)| keywords.iter().any(|k| lowered.contains(k)));
        let rule = by_name.or_else(|| {
            RULES.iter().find(|(_, keys, _, _)| {
                arguments.keys().any(|arg| keys.contains(&arg.to_lowercase().as_str()))
            })
        });

        match rule {
            Some((_, _, entry, hint)) => format!("Did you mean '{}'? Try {}", entry, hint),
            None => NO_SUGGESTION.to_string(),
        }
    }
}
