//! Threadline CLI - Database migrations and cart reports.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (schema + session store)
//! tl-cli migrate
//!
//! # List signed-in carts untouched for two days or more
//! tl-cli carts abandoned --older-than-days 2
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `carts abandoned` - Report cart lines never checked out

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(author, version, about = "Threadline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect persistent carts
    Carts {
        #[command(subcommand)]
        action: CartsAction,
    },
}

#[derive(Subcommand)]
enum CartsAction {
    /// Report lines created before the cutoff that were never checked out
    Abandoned {
        /// Age in days a line must reach to be reported
        #[arg(long, default_value_t = 2)]
        older_than_days: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Carts { action } => match action {
            CartsAction::Abandoned { older_than_days } => {
                commands::carts::abandoned(older_than_days).await?;
            }
        },
    }
    Ok(())
}
