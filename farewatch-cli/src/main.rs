use std::process::ExitCode;

use clap::Parser;
use farewatch_cli::{commands, AppError, AppState, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farewatch=info,farewatch_cli=info,farewatch_offer=info,farewatch_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => err.report(),
    }
}

async fn run(cli: Cli) -> Result<String, AppError> {
    let config = farewatch_store::app_config::Config::load().map_err(anyhow::Error::from)?;
    let state = AppState::from_config(&config, cli.ledger)?;
    commands::execute(cli.command, &state).await
}
