pub mod account;
pub mod server;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "user_service")]
#[command(about = "User account service", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "user_service.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the account operations over JSON-RPC
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// Keep accounts in memory instead of the configured store
        #[arg(long, default_value = "false")]
        in_memory: bool,
    },
    /// Write the default config file
    InitConfig,
    /// Account administration against the configured store
    Account {
        #[command(subcommand)]
        cmd: account::AccountCommands,
    },
}
