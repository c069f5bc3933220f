use log::{debug, error, info, log};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

use crate::collectors::{GpuQuery, ProcessCounters, SystemCounters};
use crate::models::{Mode, ProcessSample, Sample, SystemSample};
use crate::platform::{WindowError, WindowInspector};
use crate::renderer::{formatter, Renderer};
use crate::utils::repeat::RepeatedFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoForegroundWindow,
    WindowQueryFailed,
    ProcessGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    Skipped(SkipReason),
}

/// Owns every counter handle and the tracking mode, and turns each tick into
/// overlay text.
///
/// The mode is fixed at construction. A skipped tick keeps the previous text,
/// so once a sample has succeeded the text is never empty.
pub struct SamplingScheduler<S, P, W, G> {
    mode: Mode,
    system: S,
    process: P,
    window: W,
    gpu: G,
    current_text: String,
    skips: RepeatedFailure<SkipReason>,
}

impl<S, P, W, G> SamplingScheduler<S, P, W, G>
where
    S: SystemCounters,
    P: ProcessCounters,
    W: WindowInspector,
    G: GpuQuery,
{
    pub fn new(mode: Mode, system: S, process: P, window: W, gpu: G) -> Self {
        Self {
            mode,
            system,
            process,
            window,
            gpu,
            current_text: String::new(),
            skips: RepeatedFailure::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub async fn tick(&mut self) -> TickOutcome {
        let start = Instant::now();
        let outcome = match self.mode {
            Mode::SystemWide => self.tick_system().await,
            Mode::FocusedWindow => self.tick_focused().await,
        };
        if outcome == TickOutcome::Rendered {
            self.skips.clear();
        }
        debug!("tick ({:?}) took: {} ms", outcome, start.elapsed().as_millis());
        outcome
    }

    async fn tick_system(&mut self) -> TickOutcome {
        let readings = self.system.sample();
        let gpu = self.gpu.query().await;
        let sample = SystemSample::new(self.system.kernel_version(), readings, gpu);
        self.publish(Sample::System(sample));
        TickOutcome::Rendered
    }

    async fn tick_focused(&mut self) -> TickOutcome {
        let window = match self.window.resolve_active().await {
            Ok(window) => window,
            Err(WindowError::NotFound) => {
                debug!("No foreground window, skipping tick");
                return TickOutcome::Skipped(SkipReason::NoForegroundWindow);
            }
            Err(e) => {
                let level = self.skips.level(SkipReason::WindowQueryFailed);
                log!(level, "{}", e);
                return TickOutcome::Skipped(SkipReason::WindowQueryFailed);
            }
        };

        // Rebind only when focus moved to another process.
        if self.process.bound().map(|target| target.pid) != Some(window.pid) {
            if let Err(e) = self.process.bind(&window) {
                let level = self.skips.level(SkipReason::ProcessGone);
                log!(level, "Cannot track focused window '{}': {}", window.title, e);
                return TickOutcome::Skipped(SkipReason::ProcessGone);
            }
        }

        let readings = match self.process.sample() {
            Ok(readings) => readings,
            Err(e) => {
                let level = self.skips.level(SkipReason::ProcessGone);
                log!(level, "{}, re-resolving on the next tick", e);
                self.process.unbind();
                return TickOutcome::Skipped(SkipReason::ProcessGone);
            }
        };

        let gpu = self.gpu.query().await;
        let sample = ProcessSample::new(&window, self.system.kernel_version(), readings, gpu);
        self.publish(Sample::Process(sample));
        TickOutcome::Rendered
    }

    fn publish(&mut self, sample: Sample) {
        self.current_text = formatter::format(&sample);
    }

    /// Tick every `period` and hand the current text to `renderer`. A slow
    /// tick delays the next one; missed ticks are not replayed.
    pub async fn run<R: Renderer>(&mut self, renderer: &mut R, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Sampling every {} ms in {} mode", period.as_millis(), self.mode);

        loop {
            interval.tick().await; // Wait for the next tick
            self.tick().await;

            if self.current_text.is_empty() {
                continue;
            }
            if let Err(e) = renderer.display(&self.current_text) {
                error!("Failed to display overlay: {:#}", e);
            }
        }
    }
}
