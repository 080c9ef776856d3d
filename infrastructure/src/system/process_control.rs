//! Process termination with permission-aware error reporting.

use dispatch_domain::tool::{FailureKind, Outcome};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KillError {
    #[error("process not found")]
    NotFound,

    #[error("permission denied")]
    AccessDenied,

    #[error("{0}")]
    Other(String),
}

impl KillError {
    pub fn into_outcome(self, pid: u32) -> Outcome {
        match self {
            KillError::NotFound => {
                Outcome::invalid_argument(format!("No process found with PID {}", pid))
            }
            KillError::AccessDenied => Outcome::failed(
                FailureKind::ExecutionFailure,
                format!("Access denied when killing PID {}", pid),
            ),
            KillError::Other(detail) => Outcome::execution_failure(format!(
                "Failed to kill PID {}: {}",
                pid, detail
            )),
        }
    }
}

/// Send SIGTERM and classify the errno.
#[cfg(unix)]
pub fn terminate(pid: u32, _process: &sysinfo::Process) -> Result<(), KillError> {
    let raw = libc::pid_t::try_from(pid).map_err(|_| KillError::NotFound)?;
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(raw, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Err(KillError::NotFound),
        Some(libc::EPERM) => Err(KillError::AccessDenied),
        _ => Err(KillError::Other(err.to_string())),
    }
}

#[cfg(not(unix))]
pub fn terminate(_pid: u32, process: &sysinfo::Process) -> Result<(), KillError> {
    if process.kill() {
        Ok(())
    } else {
        Err(KillError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            KillError::AccessDenied.into_outcome(1).text(),
            "Access denied when killing PID 1"
        );
        assert_eq!(
            KillError::NotFound.into_outcome(42).text(),
            "No process found with PID 42"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_init_is_denied_for_unprivileged_users() {
        // SAFETY: geteuid has no preconditions.
        if unsafe { libc::geteuid() } == 0 {
            return;
        }
        let mut sys = sysinfo::System::new();
        sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        let Some(init) = sys.process(sysinfo::Pid::from_u32(1)) else {
            return;
        };
        assert_eq!(terminate(1, init), Err(KillError::AccessDenied));
    }

    #[cfg(unix)]
    #[test]
    fn test_kill_child_process() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        let mut sys = sysinfo::System::new();
        sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        let process = sys.process(sysinfo::Pid::from_u32(pid)).unwrap();
        assert_eq!(terminate(pid, process), Ok(()));
        let _ = child.wait();
    }
}
