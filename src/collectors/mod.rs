use std::time::Duration;

use crate::models::{GpuInfo, ProcessReadings, ProcessTarget, SystemReadings};
use crate::platform::ForegroundWindow;

pub(crate) mod disk;
pub(crate) mod gpu;
pub(crate) mod process;
pub(crate) mod system;

pub use gpu::GpuInfoProvider;
pub use process::{ProcessCounterSource, ProcessError};
pub use system::{CounterError, CounterSource};

pub(crate) const BYTES_PER_MB: f32 = 1024.0 * 1024.0;

/// System-wide counters, opened once at startup.
pub trait SystemCounters {
    fn kernel_version(&self) -> &str;
    fn sample(&mut self) -> SystemReadings;
}

/// Counters scoped to the process behind the focused window.
pub trait ProcessCounters {
    fn bound(&self) -> Option<&ProcessTarget>;
    fn bind(&mut self, window: &ForegroundWindow) -> Result<ProcessTarget, ProcessError>;
    fn sample(&mut self) -> Result<ProcessReadings, ProcessError>;
    fn unbind(&mut self);
}

#[allow(async_fn_in_trait)]
pub trait GpuQuery {
    async fn query(&mut self) -> GpuInfo;
}

/// Bytes moved over `elapsed`, as MiB per second.
pub(crate) fn rate_mb_per_sec(bytes: u64, elapsed: Duration) -> f32 {
    let secs = elapsed.as_secs_f32();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f32 / BYTES_PER_MB / secs
}
