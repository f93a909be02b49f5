use anyhow::Context;
use clap::Parser;
use kube_job_runner::cli::{render_job, Cli};
use kube_job_runner::core::logging::init_logging_with_config;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Loaded before the subscriber exists; reported once logging is up.
    let env_file = cli.load_env_file().context("Failed to load env file")?;
    let config = cli
        .load_config()
        .await
        .context("Failed to load configuration")?;

    init_logging_with_config(&config.logging)?;

    match env_file {
        Some(path) => info!("✅ Loaded .env file from {}", path.display()),
        None => debug!("No .env file found, using system environment variables"),
    }
    match cli.config_manager().resolved_path() {
        Some(path) => info!(path = %path, "📋 Configuration loaded successfully"),
        None => info!("📋 Configuration loaded from defaults and environment"),
    }

    let report = cli
        .execute(&config)
        .await
        .context("Failed to set up Kubernetes client")?;

    let rendered = render_job(report.created.as_ref(), config.output)?;
    print!("{}", rendered);

    Ok(())
}
