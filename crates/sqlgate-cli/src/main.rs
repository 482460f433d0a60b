use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sqlgate", version, about = "SQL gateway with column-level ACLs")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway.
    Serve {
        /// Path to the JSON configuration file.
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
    },

    /// Validate a configuration file and exit.
    Check {
        /// Path to the JSON configuration file.
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve { config } => commands::serve::run(&config).await,
        Command::Check { config } => commands::check::run(&config),
    }
}
