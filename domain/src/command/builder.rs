//! Logical operations and their per-platform renderings.

use super::Platform;

const DEFAULT_LINE_COUNT: usize = 10;

/// A shell operation independent of any platform's spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalOp {
    FirstLines(usize),
    LastLines(usize),
    CountLines,
    FilterLines(String),
    ListDirectory,
    ListProcesses,
    ListPackages,
    PrintWorkingDirectory,
    ShowFile(String),
    ClearScreen,
}

/// Renders [`LogicalOp`]s for a target platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandBuilder;

impl CommandBuilder {
    pub fn build(op: &LogicalOp, platform: Platform) -> String {
        match platform {
            Platform::Posix => Self::posix(op),
            Platform::Windows => Self::windows(op),
        }
    }

    fn posix(op: &LogicalOp) -> String {
        match op {
            LogicalOp::FirstLines(n) => format!("head -n {}", n),
            LogicalOp::LastLines(n) => format!("tail -n {}", n),
            LogicalOp::CountLines => "wc -l".to_string(),
            LogicalOp::FilterLines(pattern) => format!("grep {}", pattern),
            LogicalOp::ListDirectory => "ls".to_string(),
            LogicalOp::ListProcesses => "ps aux".to_string(),
            LogicalOp::ListPackages => "pip list".to_string(),
            LogicalOp::PrintWorkingDirectory => "pwd".to_string(),
            LogicalOp::ShowFile(path) => format!("cat {}", path),
            LogicalOp::ClearScreen => "clear".to_string(),
        }
    }

    fn windows(op: &LogicalOp) -> String {
        match op {
            LogicalOp::FirstLines(n) => format!("Select-Object -First {}", n),
            LogicalOp::LastLines(n) => format!("Select-Object -Last {}", n),
            LogicalOp::CountLines => "Measure-Object -Line".to_string(),
            LogicalOp::FilterLines(pattern) => format!("Select-String -Pattern {}", pattern),
            LogicalOp::ListDirectory => "Get-ChildItem".to_string(),
            LogicalOp::ListProcesses => "Get-Process".to_string(),
            LogicalOp::ListPackages => "python -m pip list".to_string(),
            LogicalOp::PrintWorkingDirectory => "Get-Location".to_string(),
            LogicalOp::ShowFile(path) => format!("Get-Content {}", path),
            LogicalOp::ClearScreen => "Clear-Host".to_string(),
        }
    }
}

/// Parse a `head`/`tail` line-count argument list.
fn line_count(args: &[&str]) -> Option<usize> {
    match args {
        [] => Some(DEFAULT_LINE_COUNT),
        ["-n", n] => n.parse().ok(),
        [flag] => {
            let digits = flag.strip_prefix("-n").or_else(|| flag.strip_prefix('-'))?;
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Recognize a single pipeline stage as a logical operation.
///
/// Returns `None` for anything outside the small, well-understood set,
/// including recognized commands carrying flags we do not model.
pub fn parse_stage(stage: &str) -> Option<LogicalOp> {
    let words: Vec<&str> = stage.split_whitespace().collect();
    let (command, args) = words.split_first()?;

    match (*command, args) {
        ("head", args) => line_count(args).map(LogicalOp::FirstLines),
        ("tail", args) => line_count(args).map(LogicalOp::LastLines),
        ("wc", ["-l"]) => Some(LogicalOp::CountLines),
        ("grep", [pattern]) if !pattern.starts_with('-') => {
            Some(LogicalOp::FilterLines((*pattern).to_string()))
        }
        ("ls", []) | ("ls", ["-l" | "-la" | "-al" | "-a"]) => Some(LogicalOp::ListDirectory),
        ("ps", []) | ("ps", ["aux" | "-ef" | "-e"]) => Some(LogicalOp::ListProcesses),
        ("pip" | "pip3", ["list"]) => Some(LogicalOp::ListPackages),
        ("pwd", []) => Some(LogicalOp::PrintWorkingDirectory),
        ("cat", [path]) if !path.starts_with('-') => Some(LogicalOp::ShowFile((*path).to_string())),
        ("clear", []) => Some(LogicalOp::ClearScreen),
        _ => None,
    }
}
