//! Yakimoto CLI - Session table setup and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! yk-cli migrate storefront
//!
//! # Create the admin session table
//! yk-cli migrate admin
//!
//! # Both
//! yk-cli migrate all
//!
//! # Check that the REST backend answers
//! yk-cli backend ping
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create session storage
//! - `backend ping` - Reach the shop REST backend and summarize the catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "yk-cli")]
#[command(author, version, about = "Yakimoto Dojo CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Talk to the shop REST backend
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table
    Storefront,
    /// Admin session table
    Admin,
    /// Both session tables
    All,
}

#[derive(Subcommand)]
enum BackendAction {
    /// Check connectivity and count products and categories
    Ping,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Backend { action } => match action {
            BackendAction::Ping => commands::backend::ping().await?,
        },
    }
    Ok(())
}
