use humansize::{format_size, BINARY};
use log::{debug, info};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System as SysInfo};
use thiserror::Error;

use crate::collectors::{rate_mb_per_sec, ProcessCounters};
use crate::models::{ProcessReadings, ProcessTarget};
use crate::platform::ForegroundWindow;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process {pid} ({name}) is gone")]
    Gone { pid: u32, name: String },

    #[error("no process bound")]
    Unbound,
}

/// CPU, working set and I/O counters for a single process.
///
/// CPU usage is the per-process reading divided by the logical processor
/// count, so a process saturating every core reads 100%.
pub struct ProcessCounterSource {
    sys: SysInfo,
    target: Option<ProcessTarget>,
    logical_cpus: usize,
    last_refresh: Instant,
}

impl ProcessCounterSource {
    pub fn new(logical_cpus: usize) -> Self {
        Self {
            sys: SysInfo::new(),
            target: None,
            logical_cpus: logical_cpus.max(1),
            last_refresh: Instant::now(),
        }
    }

    fn refresh(&mut self, pid: Pid) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refresh);
        self.last_refresh = now;
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_disk_usage(),
        );
        elapsed
    }
}

fn is_exited(status: ProcessStatus) -> bool {
    matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

impl ProcessCounters for ProcessCounterSource {
    fn bound(&self) -> Option<&ProcessTarget> {
        self.target.as_ref()
    }

    fn bind(&mut self, window: &ForegroundWindow) -> Result<ProcessTarget, ProcessError> {
        self.target = None;
        let pid = Pid::from_u32(window.pid);
        self.refresh(pid);

        let process = self
            .sys
            .process(pid)
            .filter(|process| !is_exited(process.status()))
            .ok_or_else(|| ProcessError::Gone {
                pid: window.pid,
                name: String::new(),
            })?;

        let target = ProcessTarget {
            pid: window.pid,
            name: process.name().to_string_lossy().into_owned(),
        };
        info!(
            "Tracking {} (pid {}, working set {})",
            target.name,
            target.pid,
            format_size(process.memory(), BINARY)
        );

        self.target = Some(target.clone());
        Ok(target)
    }

    fn sample(&mut self) -> Result<ProcessReadings, ProcessError> {
        let start = Instant::now();
        let target = self.target.clone().ok_or(ProcessError::Unbound)?;
        let pid = Pid::from_u32(target.pid);
        let elapsed = self.refresh(pid);

        let gone = || ProcessError::Gone {
            pid: target.pid,
            name: target.name.clone(),
        };
        let process = self.sys.process(pid).ok_or_else(gone)?;
        // A reused pid belongs to a different executable.
        if is_exited(process.status()) || process.name().to_string_lossy() != target.name {
            return Err(gone());
        }

        let disk = process.disk_usage();
        let result = ProcessReadings {
            cpu_percent: process.cpu_usage().max(0.0) / self.logical_cpus as f32,
            memory_used_mb: process.memory() / 1024 / 1024,
            disk_read_mbps: rate_mb_per_sec(disk.read_bytes, elapsed),
            disk_write_mbps: rate_mb_per_sec(disk.written_bytes, elapsed),
        };
        debug!("process sample took: {} ms", start.elapsed().as_millis());
        Ok(result)
    }

    fn unbind(&mut self) {
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_for(pid: u32) -> ForegroundWindow {
        ForegroundWindow {
            handle: 1,
            title: "test".to_string(),
            pid,
        }
    }

    #[test]
    fn test_sample_unbound() {
        let mut source = ProcessCounterSource::new(4);
        assert!(matches!(source.sample(), Err(ProcessError::Unbound)));
    }

    #[test]
    fn test_bind_current_process() {
        let mut source = ProcessCounterSource::new(1);
        let target = source.bind(&window_for(std::process::id())).unwrap();
        assert_eq!(target.pid, std::process::id());
        assert!(!target.name.is_empty());
        assert_eq!(source.bound(), Some(&target));

        let readings = source.sample().unwrap();
        assert!(readings.cpu_percent >= 0.0);
        assert!(readings.memory_used_mb > 0);
        assert!(readings.disk_read_mbps >= 0.0);
        assert!(readings.disk_write_mbps >= 0.0);

        source.unbind();
        assert!(source.bound().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_sample_after_exit_is_gone() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let mut source = ProcessCounterSource::new(2);
        source.bind(&window_for(child.id())).unwrap();

        child.kill().unwrap();
        child.wait().unwrap();

        assert!(matches!(source.sample(), Err(ProcessError::Gone { .. })));
    }
}
