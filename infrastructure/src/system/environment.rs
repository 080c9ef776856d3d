//! Environment variables, PATH inspection and ping.

use std::path::Path;
use std::time::Duration;

use dispatch_domain::command::Platform;
use dispatch_domain::tool::Outcome;
use dispatch_domain::util::cap_with_marker;

use crate::execution::{CommandSpec, ProcessError, find_program, run_process};

const IMPORTANT_VARIABLES: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "USERNAME",
    "USERPROFILE",
    "SHELL",
    "LANG",
    "PWD",
    "TEMP",
    "TMPDIR",
    "EDITOR",
    "TERM",
    "PYTHONPATH",
    "VIRTUAL_ENV",
    "CONDA_DEFAULT_ENV",
    "JAVA_HOME",
    "NODE_PATH",
    "GOPATH",
    "CARGO_HOME",
    "RUSTUP_HOME",
    "COMPUTERNAME",
    "OS",
];

const VALUE_LIMIT: usize = 100;
const MAX_PING_COUNT: i64 = 10;

/// One variable, or the curated list when `name` is `None`.
pub fn environment_variables(name: Option<&str>) -> Outcome {
    if let Some(name) = name {
        return match std::env::var(name) {
            Ok(value) => Outcome::completed(format!("{}={}", name, value)),
            Err(_) => Outcome::completed(format!("Environment variable '{}' is not set", name)),
        };
    }

    let lines: Vec<String> = IMPORTANT_VARIABLES
        .iter()
        .filter_map(|var| {
            std::env::var(var)
                .ok()
                .map(|value| format!("{}={}", var, cap_with_marker(&value, VALUE_LIMIT, "...")))
        })
        .collect();
    if lines.is_empty() {
        Outcome::completed("No common environment variables are set")
    } else {
        Outcome::completed(lines.join("\n"))
    }
}

/// PATH entries with an existence marker per entry.
pub fn path_info() -> Outcome {
    let Some(path) = std::env::var_os("PATH") else {
        return Outcome::completed("PATH is not set");
    };
    let entries: Vec<String> = std::env::split_paths(&path)
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| {
            let marker = if p.is_dir() { "[ok]     " } else { "[missing]" };
            format!("{} {}", marker, p.display())
        })
        .collect();
    Outcome::completed(format!("PATH entries ({}):\n{}", entries.len(), entries.join("\n")))
}

/// Hostnames, IPv4 and IPv6 literals; nothing a shell could interpret.
pub fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && !host.starts_with('-')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '_'))
}

pub async fn ping(
    host: &str,
    count: Option<i64>,
    timeout: Duration,
    cwd: &Path,
    platform: Platform,
) -> Outcome {
    if !is_valid_host(host) {
        return Outcome::invalid_argument(format!("Invalid host: {}", host));
    }
    let Some(program) = find_program(&["ping"]) else {
        return Outcome::dependency_missing("Ping requires the ping utility (ping not found in PATH)");
    };

    let count = count.unwrap_or(4).clamp(1, MAX_PING_COUNT).to_string();
    let count_flag = if platform.is_windows() { "-n" } else { "-c" };
    let spec = CommandSpec::new(program, cwd)
        .args([count_flag, count.as_str(), host])
        .with_timeout(timeout);

    match run_process(&spec, 64 * 1024).await {
        Ok(out) if out.success => Outcome::completed(out.stdout.trim_end()),
        Ok(out) => {
            let detail = if out.stdout.trim().is_empty() { out.stderr } else { out.stdout };
            Outcome::execution_failure(format!("Ping to {} failed:\n{}", host, detail.trim_end()))
        }
        Err(ProcessError::Timeout { timeout }) => Outcome::timeout(format!(
            "Ping command timed out after {}s",
            timeout.as_secs()
        )),
        Err(e) => Outcome::execution_failure(format!("Ping execution error: {}", e)),
    }
}
