use clap::Parser;
use nostrd::config::Settings;
use nostrd::hub::Hub;
use nostrd::store::EventStore;
use nostrd::ws::{self, RelayState};

/// Command line interface entry point.
#[derive(Parser)]
#[command(name = "nostrd", author, version, about = "In-memory NIP-01 Nostr relay")]
struct Cli {
    /// Path to the `.env` configuration file.
    #[arg(long, default_value = ".env")]
    env: String,
}

/// Load settings and run the relay until shutdown.
async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = Settings::from_env(&cli.env)?;
    let state = RelayState::new(EventStore::new(), Hub::spawn(), cfg.queue_depth);
    ws::serve(cfg.bind_ws, state, std::future::pending()).await
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();
    run(cli).await
}
