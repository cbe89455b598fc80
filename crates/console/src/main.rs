use std::process::ExitCode;

use clap::Parser;

use bizdesk_client::ClientConfig;
use bizdesk_console::{App, Cli, Command, describe_error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    bizdesk_observability::init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {}", describe_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    let app = App::from_config(&config)?;
    let today = chrono::Local::now().date_naive();
    let output = app.run(command, today).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
