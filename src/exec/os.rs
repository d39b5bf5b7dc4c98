// src/exec/os.rs

//! Platform-specific process helpers.

use std::io;

/// Kill every process in the group led by `pid`.
///
/// Children are spawned with `process_group(0)`, so the group id equals the
/// leader's pid. Must only be called while the leader has not been reaped.
#[cfg(unix)]
pub fn kill_process_group(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let pgid = i32::try_from(pid)
        .map_err(|_| io::Error::other(format!("pid {pid} out of range")))?;
    killpg(Pid::from_raw(pgid), Signal::SIGKILL).map_err(io::Error::from)
}

#[cfg(not(unix))]
pub fn kill_process_group(_pid: u32) -> io::Result<()> {
    Ok(())
}

/// Peak resident set size (`VmHWM`) of a live process, in KiB.
#[cfg(target_os = "linux")]
pub fn peak_rss_kb(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    parse_vm_hwm(&status)
}

#[cfg(not(target_os = "linux"))]
pub fn peak_rss_kb(_pid: u32) -> Option<u64> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_vm_hwm(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vm_hwm_line() {
        let status = "Name:\tsh\nVmPeak:\t  10000 kB\nVmHWM:\t    2048 kB\nVmRSS:\t 1024 kB\n";
        assert_eq!(parse_vm_hwm(status), Some(2048));
        assert_eq!(parse_vm_hwm("Name:\tsh\n"), None);
    }

    #[cfg(unix)]
    #[test]
    fn group_kill_reaches_the_leader() {
        use std::os::unix::process::{CommandExt, ExitStatusExt};

        let mut child = std::process::Command::new("sh")
            .args(["-c", "sleep 30 & sleep 30"])
            .process_group(0)
            .spawn()
            .unwrap();
        kill_process_group(child.id()).unwrap();

        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(9));
    }
}
