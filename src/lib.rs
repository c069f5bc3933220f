pub mod collectors;
pub mod config;
pub mod models;
pub mod platform;
pub mod prompt;
pub mod renderer;
pub mod scheduler;

mod utils;

use crate::collectors::{CounterSource, GpuInfoProvider, ProcessCounterSource};
use crate::config::AppConfig;
use crate::models::Mode;
use crate::renderer::TerminalRenderer;
use crate::scheduler::SamplingScheduler;
use anyhow::Context;
use log::{error, info};

pub async fn run(config: AppConfig, mode: Mode) -> anyhow::Result<()> {
    info!("Starting resource overlay");

    tokio::select! {
        result = main_loop(&config, mode) => {
            match result {
                Ok(_) => info!("Application completed successfully"),
                Err(e) => {
                    error!("Application error: {e:#}");
                    // Print chain of error causes
                    for cause in e.chain().skip(1) {
                        error!("Caused by: {cause}");
                    }
                    return Err(e).context("Application failed to run");
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}

async fn main_loop(config: &AppConfig, mode: Mode) -> anyhow::Result<()> {
    let system = CounterSource::open(&config.counters)
        .context("Failed to open system performance counters")?;
    let process = ProcessCounterSource::new(system.logical_cpus());

    let mut scheduler = SamplingScheduler::new(
        mode,
        system,
        process,
        platform::native_inspector(),
        GpuInfoProvider::new(),
    );
    let mut renderer = TerminalRenderer::stdout(config.overlay.clear_screen);

    scheduler.run(&mut renderer, config.overlay.interval()).await;
    Ok(())
}
