// src/main.rs — worklog entry point

use clap::Parser;

use worklog::cli::{Cli, Commands};
use worklog::infra::config::Config;
use worklog::infra::daemon;
use worklog::infra::logger;
use worklog::integrations::credentials::IntegrationCredentials;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG / WORKLOG_LOG)
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        let mut config = Config::load_from(std::path::Path::new(path))?;
        config.apply_env_overrides();
        config
    } else {
        Config::load()?
    };

    match cli.command {
        Some(Commands::Connect { app, token }) => {
            worklog::cli::connect::run_connect(&app, token.as_deref()).await
        }
        Some(Commands::Check) => worklog::cli::check::run_check(&config).await,
        Some(Commands::Run) | None => {
            let creds = IntegrationCredentials::load()?;
            let ctx = daemon::build_context(config, &creds).await?;
            daemon::run_daemon(ctx).await
        }
    }
}
