use crate::models::{GpuInfo, ProcessSample, Sample, SystemSample};

/// Render a sample as the overlay's fixed-order text block.
///
/// Pure: the same sample always yields the same text.
pub fn format(sample: &Sample) -> String {
    let mut lines = Vec::new();
    match sample {
        Sample::System(sample) => format_system(sample, &mut lines),
        Sample::Process(sample) => format_process(sample, &mut lines),
    }
    lines.join("\n")
}

fn format_system(sample: &SystemSample, lines: &mut Vec<String>) {
    lines.push(format!("Kernel Version: {}", sample.kernel_version));
    lines.push(format!("CPU Usage: {:.2}%", sample.cpu_percent));
    lines.push(format!("Available RAM: {:.2} MB", sample.available_memory_mb));
    lines.push(format!("Disk Read: {:.2} MB/s", sample.disk_read_mbps));
    lines.push(format!("Disk Write: {:.2} MB/s", sample.disk_write_mbps));
    format_gpu(&sample.gpu, lines);
}

fn format_process(sample: &ProcessSample, lines: &mut Vec<String>) {
    lines.push(format!("Kernel Version: {}", sample.kernel_version));
    lines.push(format!("Focused Window: {}", single_line(&sample.window_title)));
    lines.push(format!("CPU Usage: {:.2}%", sample.cpu_percent));
    lines.push(format!("Memory Usage: {} MB", sample.memory_used_mb));
    lines.push(format!("Disk Read: {:.2} MB/s", sample.disk_read_mbps));
    lines.push(format!("Disk Write: {:.2} MB/s", sample.disk_write_mbps));
    format_gpu(&sample.gpu, lines);
}

fn format_gpu(gpu: &GpuInfo, lines: &mut Vec<String>) {
    lines.push("GPU Info:".to_string());
    match gpu {
        GpuInfo::Adapters(adapters) => {
            for adapter in adapters {
                lines.push(format!("Name: {}", adapter.name));
                lines.push(format!("Driver Version: {}", adapter.driver_version));
                lines.push(format!("Status: {}", adapter.status));
                lines.push(format!("Current Refresh Rate: {} Hz", adapter.refresh_rate_hz));
            }
        }
        GpuInfo::Unavailable(message) => {
            lines.push(format!("Error: {}", single_line(message)));
        }
    }
}

/// Line breaks become spaces; other whitespace is kept as is.
fn single_line(text: &str) -> String {
    text.trim_end_matches(['\r', '\n'])
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}
