use clap::Parser;
use tracing_subscriber::EnvFilter;

use user_service::cli::{self, Cli, Commands};
use user_service::config::ServiceConfig;

/// RUST_LOG wins over the configured level
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = ServiceConfig::load(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    match cli.command {
        Commands::InitConfig => {
            ServiceConfig::default().save(&cli.config)?;
            println!("Default config written to {}", cli.config);
        }
        Commands::Serve { port, in_memory } => {
            let config = ServiceConfig::resolve(loaded, &cli.config)?;
            cli::server::run_server(config, port, in_memory).await?;
        }
        Commands::Account { cmd } => {
            let config = ServiceConfig::resolve(loaded, &cli.config)?;
            cli::account::handle_account_command(cmd, &config)?;
        }
    }

    Ok(())
}
