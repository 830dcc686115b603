pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "messages-api")]
#[command(about = "Messages API - CRUD service for chat messages")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Database URL (overrides DATABASE_URL)")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Reset the messages table and insert a sample message")]
    Seed,
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        config
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::handle(args, config).await,
        None => commands::serve::handle(commands::serve::ServeArgs::default(), config).await,
        Some(Commands::Seed) => commands::seed::handle(config).await,
    }
}
