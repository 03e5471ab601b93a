use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod control;
mod wiring;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "alert-server")]
#[command(about = "Weather alert matching and fan-out engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run database migrations and exit.
    Migrate,

    /// Run the engine-control HTTP server. The poll loop itself only starts once
    /// `POST /engine/start` is called, unless `--autostart-engine` is set.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ServerConfig::from_env().context("load server config")?;
    init_tracing(&cfg.log_format);

    let cli = Cli::parse();

    match cli.command {
        Command::Migrate => {
            alert_state::pool::connect(&cfg.db_path)
                .await
                .map_err(anyhow::Error::from)
                .context("run migrations")?;
            tracing::info!(event = "alert_server.migrated");
            Ok(())
        }
        Command::Serve => {
            let engine = wiring::build_engine(&cfg).await.context("wire engine")?;

            if cfg.autostart_engine {
                engine.start().await;
            }

            control::serve(engine, &cfg.bind).await
        }
    }
}

fn init_tracing(format: &str) {
    let filter = EnvFilter::from_default_env();
    if format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }
}
