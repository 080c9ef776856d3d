//! Out-of-process python sandbox.
//!
//! The snippet never runs in the interpreter's normal global scope. A small
//! runner script (passed with `-c`) reads `{"allow": ..., "code": ...}`
//! from stdin, builds `__builtins__` from the [`CapabilityAllowList`] and
//! `exec`s the snippet in that scope. Imports are limited to the listed
//! modules unless the profile grants the real `__import__`.

use std::path::Path;
use std::time::Duration;

use dispatch_domain::command::{Platform, SystemCommandDetector, rewrite_python_snippet};
use dispatch_domain::sandbox::{CapabilityAllowList, SandboxProfile};
use serde_json::json;
use tracing::debug;

use super::process::{CommandSpec, find_program};

/// Runner executed with `python -c`.
pub const RUNNER_PRELUDE: &str = r#"
import builtins, json, sys

def _first_lines(result, n):
    def cut(text):
        if not text:
            return text
        lines = text.splitlines(True)[:n]
        return (b"" if isinstance(text, bytes) else "").join(lines)
    if hasattr(result, "stdout"):
        result.stdout = cut(result.stdout)
        return result
    return cut(result)

def _main():
    request = json.loads(sys.stdin.read())
    allow = request["allow"]
    modules = set(allow["modules"])
    safe = {name: getattr(builtins, name) for name in allow["builtins"] if hasattr(builtins, name)}
    if "__import__" not in safe:
        def _guarded_import(name, globals=None, locals=None, fromlist=(), level=0):
            if name.split(".")[0] not in modules:
                raise ImportError("import of '%s' is not allowed in the restricted sandbox" % name)
            return __import__(name, globals, locals, fromlist, level)
        safe["__import__"] = _guarded_import
    scope = {"__builtins__": safe, "__name__": "__main__", "_first_lines": _first_lines}
    for module in allow["modules"]:
        scope[module] = __import__(module)
    exec(compile(request["code"], "<tool-call>", "exec"), scope)

try:
    _main()
except SystemExit:
    raise
except BaseException:
    import traceback
    traceback.print_exc()
    sys.exit(1)
"#;

/// A snippet ready to run: rewritten code plus its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSnippet {
    pub code: String,
    pub profile: SandboxProfile,
}

#[derive(Debug, Clone)]
pub struct PythonRunner {
    interpreters: Vec<String>,
    timeout: Duration,
    allow_system_profile: bool,
    platform: Platform,
}

impl PythonRunner {
    pub fn new(interpreters: Vec<String>, timeout: Duration, allow_system_profile: bool) -> Self {
        Self {
            interpreters,
            timeout,
            allow_system_profile,
            platform: Platform::host(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pick the profile and rewrite shell idioms for the host platform.
    pub fn prepare(&self, code: &str) -> PreparedSnippet {
        if !SystemCommandDetector::is_system_code(code) {
            return PreparedSnippet {
                code: code.to_string(),
                profile: SandboxProfile::Restricted,
            };
        }

        let profile = if self.allow_system_profile {
            SandboxProfile::System
        } else {
            SandboxProfile::Restricted
        };
        debug!(profile = %profile, "System idioms detected in python snippet");
        PreparedSnippet {
            code: rewrite_python_snippet(code, self.platform),
            profile,
        }
    }

    /// Build the process invocation, or `None` when no interpreter exists.
    pub fn command_spec(&self, snippet: &PreparedSnippet, cwd: &Path) -> Option<CommandSpec> {
        let candidates: Vec<&str> = self.interpreters.iter().map(String::as_str).collect();
        let program = find_program(&candidates)?;
        let request = json!({
            "allow": CapabilityAllowList::for_profile(snippet.profile),
            "code": snippet.code,
        });

        Some(
            CommandSpec::new(program, cwd)
                .args(["-c", RUNNER_PRELUDE])
                .with_stdin(request.to_string())
                .with_env("PYTHONIOENCODING", "utf-8")
                .with_timeout(self.timeout),
        )
    }

    pub fn interpreter_names(&self) -> String {
        self.interpreters.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(allow_system: bool) -> PythonRunner {
        PythonRunner::new(
            vec!["python3".to_string(), "python".to_string()],
            Duration::from_secs(10),
            allow_system,
        )
        .with_platform(Platform::Posix)
    }

    #[test]
    fn test_plain_code_runs_restricted() {
        let snippet = runner(true).prepare("print(sum(range(5)))");
        assert_eq!(snippet.profile, SandboxProfile::Restricted);
        assert_eq!(snippet.code, "print(sum(range(5)))");
    }

    #[test]
    fn test_system_code_gets_system_profile() {
        let snippet = runner(true).prepare("import os\nprint(os.popen('pwd').read())");
        assert_eq!(snippet.profile, SandboxProfile::System);
    }

    #[test]
    fn test_system_profile_can_be_disabled() {
        let snippet = runner(false).prepare("import subprocess\nsubprocess.run(['ls'])");
        assert_eq!(snippet.profile, SandboxProfile::Restricted);
    }

    #[test]
    fn test_command_spec_carries_request_on_stdin() {
        let runner = runner(true);
        let Some(spec) = runner.command_spec(&runner.prepare("print(1)"), Path::new(".")) else {
            return; // no python on this machine
        };
        assert_eq!(spec.args[0], "-c");
        let request: serde_json::Value =
            serde_json::from_str(spec.stdin.as_deref().unwrap()).unwrap();
        assert_eq!(request["code"], "print(1)");
        assert_eq!(request["allow"]["profile"], "restricted");
    }
}
