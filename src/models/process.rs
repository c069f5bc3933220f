use crate::models::gpu::GpuInfo;
use crate::platform::ForegroundWindow;

/// The process the per-process counters are currently bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTarget {
    pub pid: u32,
    pub name: String,
}

/// Raw per-process counter values for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessReadings {
    pub cpu_percent: f32,
    pub memory_used_mb: u64,
    pub disk_read_mbps: f32,
    pub disk_write_mbps: f32,
}

impl Default for ProcessReadings {
    fn default() -> Self {
        Self {
            cpu_percent: 0.0,
            memory_used_mb: 0,
            disk_read_mbps: 0.0,
            disk_write_mbps: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub window_title: String,
    pub kernel_version: String,
    pub cpu_percent: f32,
    pub memory_used_mb: u64,
    pub disk_read_mbps: f32,
    pub disk_write_mbps: f32,
    pub gpu: GpuInfo,
}

impl ProcessSample {
    /// Only a resolved foreground window can produce a process sample.
    pub fn new(
        window: &ForegroundWindow,
        kernel_version: &str,
        readings: ProcessReadings,
        gpu: GpuInfo,
    ) -> Self {
        Self {
            window_title: window.title.clone(),
            kernel_version: kernel_version.to_string(),
            cpu_percent: readings.cpu_percent,
            memory_used_mb: readings.memory_used_mb,
            disk_read_mbps: readings.disk_read_mbps,
            disk_write_mbps: readings.disk_write_mbps,
            gpu,
        }
    }
}
