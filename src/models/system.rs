use crate::models::gpu::GpuInfo;

/// Raw system-wide counter values for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemReadings {
    pub cpu_percent: f32,
    pub available_memory_mb: f32,
    pub disk_read_mbps: f32,
    pub disk_write_mbps: f32,
}

impl Default for SystemReadings {
    fn default() -> Self {
        Self {
            cpu_percent: 0.0,
            available_memory_mb: 0.0,
            disk_read_mbps: 0.0,
            disk_write_mbps: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemSample {
    pub kernel_version: String,
    pub cpu_percent: f32,
    pub available_memory_mb: f32,
    pub disk_read_mbps: f32,
    pub disk_write_mbps: f32,
    pub gpu: GpuInfo,
}

impl SystemSample {
    pub fn new(kernel_version: &str, readings: SystemReadings, gpu: GpuInfo) -> Self {
        Self {
            kernel_version: kernel_version.to_string(),
            cpu_percent: readings.cpu_percent,
            available_memory_mb: readings.available_memory_mb,
            disk_read_mbps: readings.disk_read_mbps,
            disk_write_mbps: readings.disk_write_mbps,
            gpu,
        }
    }
}
