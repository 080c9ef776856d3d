//! Capability catalogue: closed alias tables for every strategy.
//!
//! Models rarely spell a capability the same way twice (`ls`, `list_dir`,
//! `list_files`...). Each strategy owns a closed enum and a static alias
//! table resolved by `match`, so the set of accepted spellings is visible
//! in one place and checked at compile time.

use super::entities::ToolCall;

/// Operations offered by the file-capability collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOperation {
    Create,
    Read,
    Write,
    Delete,
    List,
    Copy,
    Move,
    Search,
}

impl FileOperation {
    pub const ALL: [FileOperation; 8] = [
        FileOperation::Create,
        FileOperation::Read,
        FileOperation::Write,
        FileOperation::Delete,
        FileOperation::List,
        FileOperation::Copy,
        FileOperation::Move,
        FileOperation::Search,
    ];

    /// Canonical collaborator method name.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            FileOperation::Create => "create_file",
            FileOperation::Read => "read_file",
            FileOperation::Write => "write_to_file",
            FileOperation::Delete => "delete_file",
            FileOperation::List => "list_files",
            FileOperation::Copy => "copy_file",
            FileOperation::Move => "move_file",
            FileOperation::Search => "search_files",
        }
    }

    /// Resolve any accepted spelling to an operation.
    pub fn from_alias(name: &str) -> Option<Self> {
        let op = match name.trim().to_lowercase().as_str() {
            "create_file" | "create" | "new_file" | "touch" | "make_file" | "file_create" => {
                FileOperation::Create
            }
            "read_file" | "read" | "cat" | "view" | "view_file" | "open_file" | "get_file"
            | "show_file" | "file_read" => FileOperation::Read,
            "write_to_file" | "write_file" | "write" | "save_file" | "edit_file"
            | "update_file" | "overwrite_file" | "file_write" => FileOperation::Write,
            "delete_file" | "delete" | "rm" | "remove" | "remove_file" | "del" | "unlink"
            | "file_delete" => FileOperation::Delete,
            "list_files" | "list" | "ls" | "dir" | "list_dir" | "list_directory"
            | "list_directory_contents" | "show_files" | "file_list" => FileOperation::List,
            "copy_file" | "copy" | "cp" | "duplicate_file" | "file_copy" => FileOperation::Copy,
            "move_file" | "move" | "mv" | "rename" | "rename_file" | "file_move" => {
                FileOperation::Move
            }
            "search_files" | "search" | "find" | "grep" | "find_files" | "search_file"
            | "file_search" | "locate" => FileOperation::Search,
            _ => return None,
        };
        Some(op)
    }
}

/// Languages and shells the code execution engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeLanguage {
    Python,
    JavaScript,
    Shell,
    Bash,
    PowerShell,
    Cmd,
    Lua,
}

impl CodeLanguage {
    /// Parse a language name as a model would write it.
    pub fn from_name(name: &str) -> Option<Self> {
        let language = match name.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => CodeLanguage::Python,
            "javascript" | "js" | "node" | "nodejs" => CodeLanguage::JavaScript,
            "shell" | "sh" => CodeLanguage::Shell,
            "bash" => CodeLanguage::Bash,
            "powershell" | "pwsh" | "ps1" => CodeLanguage::PowerShell,
            "cmd" | "batch" | "bat" => CodeLanguage::Cmd,
            "lua" => CodeLanguage::Lua,
            _ => return None,
        };
        Some(language)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CodeLanguage::Python => "Python",
            CodeLanguage::JavaScript => "JavaScript",
            CodeLanguage::Shell => "Shell",
            CodeLanguage::Bash => "Bash",
            CodeLanguage::PowerShell => "PowerShell",
            CodeLanguage::Cmd => "CMD",
            CodeLanguage::Lua => "Lua",
        }
    }
}

impl std::fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// How a code-execution call names its language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeTarget {
    /// The tool name itself names the language (`python`, `run_bash`, ...)
    Language(CodeLanguage),
    /// Generic entry point (`execute_code`); the `language` argument decides
    FromArgument,
}

const GENERIC_CODE_NAMES: &[&str] = &[
    "execute_code",
    "run_code",
    "code",
    "code_interpreter",
    "run_script",
    "execute_script",
    "interpreter",
    "eval_code",
];

/// Resolve a tool name to a code execution target.
pub fn code_target(name: &str) -> Option<CodeTarget> {
    let name = name.trim().to_lowercase();
    if GENERIC_CODE_NAMES.contains(&name.as_str()) {
        return Some(CodeTarget::FromArgument);
    }
    let stem = name
        .strip_prefix("run_")
        .or_else(|| name.strip_prefix("execute_"))
        .or_else(|| name.strip_prefix("exec_"))
        .or_else(|| name.strip_suffix("_code"))
        .unwrap_or(&name);
    CodeLanguage::from_name(stem).map(CodeTarget::Language)
}

/// Actions of the system introspection resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemAction {
    SystemInfo,
    ListProcesses,
    KillProcess,
    ProcessInfo,
    DiskUsage,
    MemoryUsage,
    CpuUsage,
    NetworkInterfaces,
    Ping,
    EnvironmentVariables,
    PathInfo,
}

impl SystemAction {
    pub fn from_alias(name: &str) -> Option<Self> {
        let action = match name.trim().to_lowercase().as_str() {
            "system_info" | "get_system_info" | "sysinfo" | "os_info" | "platform_info"
            | "uname" => SystemAction::SystemInfo,
            "list_processes" | "processes" | "ps" | "get_processes" | "top" | "process_list"
            | "tasklist" => SystemAction::ListProcesses,
            "kill_process" | "kill" | "terminate_process" | "end_process" | "taskkill" => {
                SystemAction::KillProcess
            }
            "process_info" | "get_process_info" | "process_details" => SystemAction::ProcessInfo,
            "disk_usage" | "get_disk_usage" | "df" | "disk_space" | "storage" => {
                SystemAction::DiskUsage
            }
            "memory_usage" | "get_memory_usage" | "memory" | "ram" | "free" | "mem_info" => {
                SystemAction::MemoryUsage
            }
            "cpu_usage" | "get_cpu_usage" | "cpu" | "cpu_info" | "load" => SystemAction::CpuUsage,
            "network_interfaces" | "get_network_interfaces" | "ifconfig" | "ipconfig"
            | "network_info" | "ip_addr" => SystemAction::NetworkInterfaces,
            "ping" | "ping_host" | "check_connectivity" => SystemAction::Ping,
            "environment_variables" | "get_env" | "env" | "getenv" | "env_vars"
            | "get_environment_variable" | "environment" => SystemAction::EnvironmentVariables,
            "path_info" | "get_path" | "check_path" | "path_entries" | "show_path" => {
                SystemAction::PathInfo
            }
            _ => return None,
        };
        Some(action)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SystemAction::SystemInfo => "System info",
            SystemAction::ListProcesses => "Process listing",
            SystemAction::KillProcess => "Process termination",
            SystemAction::ProcessInfo => "Process details",
            SystemAction::DiskUsage => "Disk usage",
            SystemAction::MemoryUsage => "Memory usage",
            SystemAction::CpuUsage => "CPU usage",
            SystemAction::NetworkInterfaces => "Network interface listing",
            SystemAction::Ping => "Ping",
            SystemAction::EnvironmentVariables => "Environment variables",
            SystemAction::PathInfo => "PATH inspection",
        }
    }

    /// Whether the action needs the process/resource metrics library.
    pub fn needs_metrics(&self) -> bool {
        matches!(
            self,
            SystemAction::SystemInfo
                | SystemAction::ListProcesses
                | SystemAction::KillProcess
                | SystemAction::ProcessInfo
                | SystemAction::DiskUsage
                | SystemAction::MemoryUsage
                | SystemAction::CpuUsage
                | SystemAction::NetworkInterfaces
        )
    }
}

/// Actions of the network resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkAction {
    Get,
    Post,
    Download,
    Scrape,
}

impl NetworkAction {
    /// Resolve a call to a network action.
    ///
    /// Generic request names (`http_request`, `api_request`) pick GET or
    /// POST from the `method` argument.
    pub fn resolve(call: &ToolCall) -> Option<Self> {
        let action = match call.normalized_name().as_str() {
            "http_get" | "get_request" | "fetch_url" | "get_url" | "http_fetch" | "curl" => {
                NetworkAction::Get
            }
            "http_post" | "post_request" | "post" | "send_post" => NetworkAction::Post,
            "download_file" | "download" | "wget" | "fetch_file" => NetworkAction::Download,
            "scrape_webpage" | "scrape" | "extract_text" | "web_fetch" | "read_webpage"
            | "browse" | "scrape_url" | "get_page_text" => NetworkAction::Scrape,
            "http_request" | "api_request" | "request" | "make_request" => {
                match call.get_string("method").map(|m| m.trim().to_uppercase()) {
                    Some(m) if m == "POST" => NetworkAction::Post,
                    _ => NetworkAction::Get,
                }
            }
            _ => return None,
        };
        Some(action)
    }
}

/// Names claimed by the expression evaluator.
pub const EXPRESSION_NAMES: &[&str] = &[
    "calculator",
    "calculate",
    "calc",
    "math",
    "evaluate",
    "eval_expression",
    "compute",
    "arithmetic",
];

/// Names claimed by the raw system command fallback.
pub const RAW_COMMAND_NAMES: &[&str] = &[
    "run_command",
    "execute_command",
    "shell_command",
    "system_command",
    "terminal",
    "exec",
    "cli",
];

pub fn is_expression_name(name: &str) -> bool {
    EXPRESSION_NAMES.contains(&name.trim().to_lowercase().as_str())
}

/// Whether a call should be treated as a raw system command.
///
/// Besides the fixed names, any tool whose name mentions "command" and
/// that carries a `command` string is claimed.
pub fn is_raw_command_call(call: &ToolCall) -> bool {
    let name = call.normalized_name();
    RAW_COMMAND_NAMES.contains(&name.as_str())
        || (name.contains("command") && call.first_string(&["command"]).is_some())
}

/// Human-readable list of capabilities, used in unknown-tool errors.
pub fn capabilities_summary() -> String {
    let files = FileOperation::ALL
        .iter()
        .map(|op| op.canonical_name())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "file operations ({}), code execution (python, javascript, shell, bash, powershell, cmd, lua), \
         calculator, system introspection (system_info, list_processes, kill_process, process_info, \
         disk_usage, memory_usage, cpu_usage, network_interfaces, ping, get_env, path_info), \
         run_command, network (http_get, http_post, download_file, scrape_webpage)",
        files
    )
}
