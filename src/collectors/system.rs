use log::debug;
use std::time::Instant;
use sysinfo::System as SysInfo;
use thiserror::Error;

use crate::collectors::disk::DiskCounter;
use crate::collectors::{SystemCounters, BYTES_PER_MB};
use crate::config::CountersConfig;
use crate::models::SystemReadings;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("{counter} counter unavailable: {reason}")]
    Unavailable {
        counter: &'static str,
        reason: String,
    },
}

/// System-wide CPU, memory and disk counters plus the OS version string.
///
/// CPU usage is the aggregate over all logical processors, already within
/// 0-100. It is computed from the difference between two refreshes, so the
/// first [`SystemCounters::sample`] after [`CounterSource::open`] reads 0.
/// Disk rates have the same warm-up: the first reading only covers the time
/// since opening and can spike.
pub struct CounterSource {
    sys: SysInfo,
    disks: DiskCounter,
    kernel_version: String,
    logical_cpus: usize,
}

impl CounterSource {
    pub fn open(settings: &CountersConfig) -> Result<Self, CounterError> {
        let start = Instant::now();

        let mut sys = SysInfo::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let logical_cpus = sys.cpus().len();
        if logical_cpus == 0 {
            return Err(CounterError::Unavailable {
                counter: "Processor",
                reason: "no logical processors reported".to_string(),
            });
        }
        if sys.total_memory() == 0 {
            return Err(CounterError::Unavailable {
                counter: "Memory",
                reason: "total memory reported as zero".to_string(),
            });
        }

        let disks = DiskCounter::open(&settings.disk_filter());
        let kernel_version = kernel_version_string();

        debug!(
            "CounterSource::open took: {} ms ({} logical CPUs, {})",
            start.elapsed().as_millis(),
            logical_cpus,
            kernel_version
        );

        Ok(Self {
            sys,
            disks,
            kernel_version,
            logical_cpus,
        })
    }

    pub fn logical_cpus(&self) -> usize {
        self.logical_cpus
    }
}

impl SystemCounters for CounterSource {
    fn kernel_version(&self) -> &str {
        &self.kernel_version
    }

    fn sample(&mut self) -> SystemReadings {
        let start = Instant::now();
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        let (disk_read_mbps, disk_write_mbps) = self.disks.rates();

        let result = SystemReadings {
            cpu_percent: self.sys.global_cpu_usage().max(0.0),
            available_memory_mb: self.sys.available_memory() as f32 / BYTES_PER_MB,
            disk_read_mbps,
            disk_write_mbps,
        };
        debug!("system sample took: {} ms", start.elapsed().as_millis());
        result
    }
}

/// OS name and kernel release, e.g. `Linux 6.8.0-45-generic`.
pub fn kernel_version_string() -> String {
    let name = SysInfo::name().unwrap_or_else(|| "Unknown OS".to_string());
    match SysInfo::kernel_version() {
        Some(kernel) => format!("{} {}", name, kernel),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_sample_non_negative() {
        let mut source = CounterSource::open(&CountersConfig::default()).unwrap();
        assert!(source.logical_cpus() > 0);
        assert!(!source.kernel_version().is_empty());

        for _ in 0..2 {
            let readings = source.sample();
            assert!(readings.cpu_percent >= 0.0);
            assert!(readings.available_memory_mb >= 0.0);
            assert!(readings.disk_read_mbps >= 0.0);
            assert!(readings.disk_write_mbps >= 0.0);
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        }
    }

    #[test]
    fn test_kernel_version_string_not_empty() {
        assert!(!kernel_version_string().is_empty());
    }
}
