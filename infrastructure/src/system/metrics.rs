//! Process and resource metrics backed by `sysinfo`.
//!
//! All functions here block (CPU sampling sleeps between refreshes) and
//! are run on the blocking pool by the resolver.

use std::thread;

use dispatch_domain::tool::Outcome;
use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, Networks, Pid, ProcessesToUpdate, System};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;
const MB: f64 = 1024.0 * 1024.0;

fn gb(bytes: u64) -> f64 {
    bytes as f64 / GB
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn format_timestamp(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Refresh processes twice so per-process CPU usage is meaningful.
fn sampled_processes() -> System {
    let mut sys = System::new_all();
    thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_processes(ProcessesToUpdate::All, true);
    sys
}

pub fn system_info() -> Outcome {
    let sys = System::new_all();
    let lines = [
        format!("OS: {}", System::name().unwrap_or_else(|| "unknown".to_string())),
        format!("Version: {}", System::os_version().unwrap_or_else(|| "unknown".to_string())),
        format!("Kernel: {}", System::kernel_version().unwrap_or_else(|| "unknown".to_string())),
        format!("Hostname: {}", System::host_name().unwrap_or_else(|| "unknown".to_string())),
        format!("Architecture: {}", std::env::consts::ARCH),
        format!("CPU cores: {}", sys.cpus().len()),
        format!("Boot time: {}", format_timestamp(System::boot_time())),
    ];
    Outcome::completed(lines.join("\n"))
}

pub fn list_processes(limit: usize) -> Outcome {
    let sys = sampled_processes();
    let total_memory = sys.total_memory();

    let mut processes: Vec<_> = sys.processes().iter().collect();
    processes.sort_by(|(_, a), (_, b)| b.cpu_usage().total_cmp(&a.cpu_usage()));

    let mut out = format!("{:<8} {:<25} {:>6} {:>6}", "PID", "NAME", "CPU%", "MEM%");
    for (pid, process) in processes.iter().take(limit) {
        let name = process.name().to_string_lossy();
        out.push_str(&format!(
            "\n{:<8} {:<25} {:>6.1} {:>6.1}",
            pid.as_u32(),
            dispatch_domain::util::truncate_chars(&name, 25),
            process.cpu_usage(),
            percent(process.memory(), total_memory),
        ));
    }
    out.push_str(&format!(
        "\n\nShowing {} of {} processes",
        limit.min(processes.len()),
        processes.len()
    ));
    Outcome::completed(out)
}

pub fn process_info(pid: u32) -> Outcome {
    let sys = sampled_processes();
    let Some(process) = sys.process(Pid::from_u32(pid)) else {
        return Outcome::invalid_argument(format!("No process found with PID {}", pid));
    };

    let command_line = process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    let lines = [
        format!("PID: {}", pid),
        format!("Name: {}", process.name().to_string_lossy()),
        format!("Status: {}", process.status()),
        format!("CPU: {:.1}%", process.cpu_usage()),
        format!(
            "Memory: {:.1} MB ({:.1}%)",
            process.memory() as f64 / MB,
            percent(process.memory(), sys.total_memory())
        ),
        format!(
            "Parent PID: {}",
            process
                .parent()
                .map(|p| p.as_u32().to_string())
                .unwrap_or_else(|| "none".to_string())
        ),
        format!(
            "Executable: {}",
            process
                .exe()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ),
        format!("Command line: {}", command_line),
        format!("Started: {}", format_timestamp(process.start_time())),
    ];
    Outcome::completed(lines.join("\n"))
}

pub fn kill_process(pid: u32) -> Outcome {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, true);
    let Some(process) = sys.process(Pid::from_u32(pid)) else {
        return Outcome::invalid_argument(format!("No process found with PID {}", pid));
    };
    let name = process.name().to_string_lossy().into_owned();

    match super::process_control::terminate(pid, process) {
        Ok(()) => Outcome::completed(format!("Terminated process {} ({})", pid, name)),
        Err(e) => e.into_outcome(pid),
    }
}

pub fn disk_usage() -> Outcome {
    let disks = Disks::new_with_refreshed_list();
    if disks.list().is_empty() {
        return Outcome::completed("No disks found");
    }

    let lines: Vec<String> = disks
        .list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            format!(
                "{} ({}): {:.2} GB used of {:.2} GB ({:.1}%), {:.2} GB free",
                disk.mount_point().display(),
                disk.file_system().to_string_lossy(),
                gb(used),
                gb(total),
                percent(used, total),
                gb(disk.available_space()),
            )
        })
        .collect();
    Outcome::completed(lines.join("\n"))
}

pub fn memory_usage() -> Outcome {
    let mut sys = System::new();
    sys.refresh_memory();
    let lines = [
        format!(
            "Memory: {:.2} GB used of {:.2} GB ({:.1}%)",
            gb(sys.used_memory()),
            gb(sys.total_memory()),
            percent(sys.used_memory(), sys.total_memory())
        ),
        format!("Available: {:.2} GB", gb(sys.available_memory())),
        format!(
            "Swap: {:.2} GB used of {:.2} GB",
            gb(sys.used_swap()),
            gb(sys.total_swap())
        ),
    ];
    Outcome::completed(lines.join("\n"))
}

pub fn cpu_usage() -> Outcome {
    let mut sys = System::new();
    sys.refresh_cpu_usage();
    thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();

    let mut out = format!(
        "CPU usage: {:.1}% across {} cores",
        sys.global_cpu_usage(),
        sys.cpus().len()
    );
    for (index, cpu) in sys.cpus().iter().enumerate() {
        out.push_str(&format!("\n  core {}: {:.1}%", index, cpu.cpu_usage()));
    }
    Outcome::completed(out)
}

pub fn network_interfaces() -> Outcome {
    let networks = Networks::new_with_refreshed_list();
    let mut names: Vec<_> = networks.list().iter().collect();
    if names.is_empty() {
        return Outcome::completed("No network interfaces found");
    }
    names.sort_by(|(a, _), (b, _)| a.cmp(b));

    let lines: Vec<String> = names
        .into_iter()
        .map(|(name, data)| {
            format!(
                "{}: MAC {}, received {:.2} MB, transmitted {:.2} MB",
                name,
                data.mac_address(),
                data.total_received() as f64 / MB,
                data.total_transmitted() as f64 / MB,
            )
        })
        .collect();
    Outcome::completed(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_info_fields() {
        let text = system_info().into_text();
        assert!(text.contains("OS: "));
        assert!(text.contains(&format!("Architecture: {}", std::env::consts::ARCH)));
    }

    #[test]
    fn test_process_listing_includes_self() {
        let outcome = list_processes(10_000);
        assert!(outcome.is_completed());
        assert!(outcome.text().starts_with("PID"));
        assert!(outcome.text().contains(&std::process::id().to_string()));
    }

    #[test]
    fn test_process_info_for_self() {
        let outcome = process_info(std::process::id());
        assert!(outcome.is_completed());
        assert!(outcome.text().contains(&format!("PID: {}", std::process::id())));
    }

    #[test]
    fn test_missing_process() {
        let outcome = kill_process(u32::MAX - 7);
        assert_eq!(outcome.text(), format!("No process found with PID {}", u32::MAX - 7));
    }

    #[test]
    fn test_memory_usage() {
        assert!(memory_usage().text().starts_with("Memory: "));
    }

    #[test]
    fn test_percent_of_zero() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
