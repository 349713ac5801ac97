// tickwatch entry point: one daily indicator/alert run
use std::path::PathBuf;

use tickwatch::config::Settings;
use tickwatch::services::run_job;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting tickwatch...");

    let settings = Settings::resolve(std::env::args_os().nth(1).map(PathBuf::from))?;
    let today = chrono::Local::now().date_naive();

    match run_job(&settings, today).await? {
        Some(report) => info!(
            %today,
            processed = report.outcomes.len(),
            failed = report.failures.len(),
            "run complete"
        ),
        None => info!(%today, "market not open today, nothing to do"),
    }
    Ok(())
}
