use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;

fn main() -> Result<()> {
    let cfg = emotion_canvas::config::Config::parse();
    init_logging(cfg.log_file.as_deref())?;
    log::info!("starting emotion canvas ({:?} detector, {:?} capture)", cfg.detector, cfg.capture);

    let result = emotion_canvas::app::run(cfg);
    if let Err(err) = &result {
        log::error!("session ended with error: {err:#}");
    }
    result
}

/// Default filter is "info" unless RUST_LOG says otherwise. The terminal is
/// in raw mode while painting, so a log file keeps diagnostics off screen.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
