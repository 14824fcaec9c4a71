//! FeatureGate command-line entry point.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use featuregate_cli::{execute, load_config, logging, AppContext, Cli};
use featuregate_domain::FeatureGateError;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    // Load .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli, dotenv.is_ok()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(gate) = err.downcast_ref::<FeatureGateError>() {
                tracing::debug!(error.kind = gate.label(), "command failed");
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, dotenv_loaded: bool) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    logging::init(&config.logging)?;
    tracing::debug!(dotenv_loaded, db_path = %config.database.path, "configuration resolved");

    let ctx = AppContext::new(&config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &ctx, &mut out).await?;
    out.flush()?;
    Ok(())
}
