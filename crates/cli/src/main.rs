//! Bookstore CLI - database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! bookstore-cli migrate
//!
//! # Create the owner account if none exists
//! bookstore-cli owner ensure
//!
//! # Create an admin account (acts as the owner)
//! bookstore-cli admin create -u alice -p 'correct horse battery'
//! ```
//!
//! All commands read the same environment as the storefront binary
//! (`BOOKSTORE_DATABASE_URL`, `BOOKSTORE_OWNER_*`, ...).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bookstore-cli")]
#[command(author, version, about = "Bookstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage the owner account
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Create the owner account from configuration if none exists
    Ensure,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Login name for the new admin
        #[arg(short, long)]
        username: String,

        /// Password for the new admin
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Owner { action } => match action {
            OwnerAction::Ensure => commands::owner::ensure().await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                commands::admin::create(&username, &password).await?;
            }
        },
    }
    Ok(())
}
