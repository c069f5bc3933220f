use env_logger::{Builder, WriteStyle};
use log::error;
use resoverlay::config::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load configuration first (without logging)
    let config = AppConfig::new().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {:#}", e);
        // Fall back to default configuration
        AppConfig::default()
    });

    // Initialise logger with a configured log level
    Builder::new()
        .filter_level(config.get_log_level())
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    // Decided once, before any counter is opened.
    let mode = resoverlay::prompt::resolve_mode(&config.overlay);

    if let Err(e) = resoverlay::run(config, mode).await {
        error!("Application error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
