//! Capability allow-lists for restricted code execution.
//!
//! The allow-list is the single source of truth for what a sandboxed
//! snippet may touch. The python runner receives it as JSON and builds its
//! `__builtins__` from it; nothing outside the list is reachable.

use serde::Serialize;

/// Builtins available under every profile.
const RESTRICTED_BUILTINS: &[&str] = &[
    "abs", "all", "any", "bin", "bool", "bytes", "callable", "chr", "dict", "divmod",
    "enumerate", "filter", "float", "format", "frozenset", "getattr", "hasattr", "hash",
    "hex", "int", "isinstance", "issubclass", "iter", "len", "list", "map", "max", "min",
    "next", "oct", "ord", "pow", "print", "range", "repr", "reversed", "round", "set",
    "slice", "sorted", "str", "sum", "tuple", "type", "zip",
    "__build_class__", "object", "super", "property", "staticmethod", "classmethod",
    "ArithmeticError", "AttributeError", "Exception", "IndexError", "KeyError",
    "NameError", "RuntimeError", "StopIteration", "TypeError", "ValueError",
    "ZeroDivisionError",
];

/// Extra builtins granted by the system profile.
const SYSTEM_BUILTINS: &[&str] = &["__import__", "open", "OSError", "FileNotFoundError"];

const RESTRICTED_MODULES: &[&str] = &["math", "random", "datetime"];

const SYSTEM_MODULES: &[&str] = &["os", "sys", "subprocess"];

/// Execution profile of a sandboxed snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxProfile {
    /// Pure computation: numeric and container builtins, `math`, `random`, `datetime`.
    Restricted,
    /// Restricted plus `os`, `sys`, `subprocess` and `__import__`.
    System,
}

impl SandboxProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            SandboxProfile::Restricted => "restricted",
            SandboxProfile::System => "system",
        }
    }
}

impl std::fmt::Display for SandboxProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names a sandboxed snippet may reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityAllowList {
    pub profile: SandboxProfile,
    /// Builtin names copied into the snippet's `__builtins__`.
    pub builtins: Vec<String>,
    /// Modules pre-bound as globals.
    pub modules: Vec<String>,
}

impl CapabilityAllowList {
    pub fn for_profile(profile: SandboxProfile) -> Self {
        let mut builtins: Vec<String> = RESTRICTED_BUILTINS.iter().map(|s| s.to_string()).collect();
        let mut modules: Vec<String> = RESTRICTED_MODULES.iter().map(|s| s.to_string()).collect();

        if profile == SandboxProfile::System {
            builtins.extend(SYSTEM_BUILTINS.iter().map(|s| s.to_string()));
            modules.extend(SYSTEM_MODULES.iter().map(|s| s.to_string()));
        }

        Self {
            profile,
            builtins,
            modules,
        }
    }

    pub fn restricted() -> Self {
        Self::for_profile(SandboxProfile::Restricted)
    }

    pub fn system() -> Self {
        Self::for_profile(SandboxProfile::System)
    }

    pub fn allows_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|b| b == name)
    }

    pub fn allows_module(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }

    pub fn allows_import(&self) -> bool {
        self.allows_builtin("__import__")
    }

    /// Serialize for the out-of-process runner.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_profile_excludes_system_access() {
        let list = CapabilityAllowList::restricted();
        assert!(list.allows_builtin("print"));
        assert!(list.allows_builtin("isinstance"));
        assert!(list.allows_module("math"));
        assert!(!list.allows_import());
        assert!(!list.allows_builtin("open"));
        assert!(!list.allows_builtin("eval"));
        assert!(!list.allows_builtin("exec"));
        assert!(!list.allows_module("os"));
        assert!(!list.allows_module("subprocess"));
    }

    #[test]
    fn test_restricted_profile_allows_class_definitions() {
        let list = CapabilityAllowList::restricted();
        assert!(list.allows_builtin("__build_class__"));
        assert!(list.allows_builtin("object"));
        assert!(list.allows_builtin("super"));
    }

    #[test]
    fn test_system_profile_is_a_superset() {
        let restricted = CapabilityAllowList::restricted();
        let system = CapabilityAllowList::system();
        assert!(restricted.builtins.iter().all(|b| system.allows_builtin(b)));
        assert!(system.allows_import());
        assert!(system.allows_module("os"));
        assert!(system.allows_module("sys"));
        assert!(system.allows_module("subprocess"));
    }

    #[test]
    fn test_to_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&CapabilityAllowList::restricted().to_json()).unwrap();
        assert_eq!(json["profile"], "restricted");
        assert!(json["builtins"].as_array().unwrap().len() > 10);
        assert_eq!(json["modules"][0], "math");
    }
}
