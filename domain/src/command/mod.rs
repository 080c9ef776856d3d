//! Platform-independent command construction.
//!
//! One logical operation ("first 10 lines of output") is expressed once as
//! a [`LogicalOp`] and rendered per [`Platform`] by [`CommandBuilder`].
//! [`translate`] applies that to free-form command text conservatively:
//! only whole pipeline stages that parse as a known operation are
//! rewritten, everything else passes through untouched.
//!
//! | LogicalOp | Posix | Windows (PowerShell) |
//! |-----------|-------|----------------------|
//! | `FirstLines(n)` | `head -n n` | `Select-Object -First n` |
//! | `LastLines(n)` | `tail -n n` | `Select-Object -Last n` |
//! | `CountLines` | `wc -l` | `Measure-Object -Line` |
//! | `FilterLines(p)` | `grep p` | `Select-String -Pattern p` |
//! | `ListDirectory` | `ls` | `Get-ChildItem` |
//! | `ListProcesses` | `ps aux` | `Get-Process` |
//! | `ListPackages` | `pip list` | `python -m pip list` |

mod builder;
mod python;
mod translator;

pub use builder::{CommandBuilder, LogicalOp, parse_stage};
pub use python::{
    FIRST_LINES_HELPER, SystemCommandDetector, SystemIdiom, rewrite_captured_head,
    rewrite_python_snippet,
};
pub use translator::{split_pipeline, translate};

/// Target platform for rendered commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// Platform of the machine this binary runs on.
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Posix => write!(f, "posix"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}
