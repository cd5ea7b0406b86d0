// src/cli/mod.rs — CLI definition (clap derive)

pub mod check;
pub mod connect;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "worklog",
    about = "Discord bot that logs work sessions to Google Calendar and Sheets",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default when no subcommand is given)
    Run,
    /// Validate configuration and credentials against the live APIs
    Check,
    /// Store credentials for an integration
    Connect {
        /// Integration: discord, google, or status
        app: String,
        /// Discord: bot token. Google: client_id:client_secret:refresh_token
        token: Option<String>,
    },
}
