//! billing-digest - posts yesterday's BigQuery billing totals to Google Chat.

use billing_digest::app::invoke;
use billing_digest::cli::{Cli, Command};
use billing_digest::config::Config;
use billing_digest::error::{DigestError, Result};
use billing_digest::{logging, trigger};
use chrono::Utc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.load_env_file() {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) if cli.env_file.is_some() => {
            return Err(DigestError::config(format!("Could not load env file: {e}")));
        }
        Err(e) => warn!("Could not load .env: {}", e),
    }

    // Resolved before anything touches the network.
    let config = Config::from_env()?;

    match cli.command() {
        Command::Run => {
            let outcome = invoke(config, Utc::now()).await?;
            match outcome.interrupted {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
        Command::Serve { listen } => {
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .map_err(|e| DigestError::config(format!("Cannot listen on {listen}: {e}")))?;
            trigger::serve(listener, config)
                .await
                .map_err(|e| DigestError::internal(format!("Trigger server failed: {e}")))
        }
    }
}
