use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use xirelay::prelude::*;
use xirelay::logging;

/// Logs in to an account server, then relays the game client's lobby and
/// game-data traffic.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host name or address
    #[arg(long)]
    host: Option<String>,

    /// Account server port
    #[arg(long)]
    auth_port: Option<u16>,

    /// Game-data server port
    #[arg(long)]
    data_port: Option<u16>,

    /// Local lobby relay port
    #[arg(long)]
    lobby_port: Option<u16>,

    /// Log filter, e.g. `debug` or `xirelay=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, mut config: RelayConfig) -> RelayConfig {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.auth_port {
            config.server.auth_port = port;
        }
        if let Some(port) = self.data_port {
            config.server.data_port = port;
        }
        if let Some(port) = self.lobby_port {
            config.lobby.port = port;
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref());

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "xirelay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<bool, RelayError> {
    let config = match &cli.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::default(),
    };
    let config = cli.apply(config).validated();
    tracing::info!(auth = %config.auth_endpoint(), "connecting to account server");

    let session = Session::new(config.auth_endpoint(), config.io_timeout());
    let mut client = AccountClient::new(session, StdioPrompter::new());
    let outcome = client.run().await?;
    if !outcome.proceeds_to_game() {
        tracing::info!(?outcome, "not proceeding to the game");
        return Ok(false);
    }

    let relays = Relays::start(&config, client.session().identity()).await?;
    let end = relays.run_until(ctrl_c()).await?;
    tracing::info!(?end, "relays stopped");
    Ok(true)
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl-C received, shutting down");
}
