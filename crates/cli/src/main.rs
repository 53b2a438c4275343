//! Toko CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (including the session table)
//! toko-cli migrate
//!
//! # Delete anonymous cart rows untouched for 30 days
//! toko-cli carts prune --days 30
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `carts prune` - Delete stale anonymous cart rows

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "toko-cli")]
#[command(author, version, about = "Toko CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Maintain shopping carts
    Carts {
        #[command(subcommand)]
        action: CartsAction,
    },
}

#[derive(Debug, Subcommand)]
enum CartsAction {
    /// Delete anonymous cart rows not updated for the given number of days
    Prune {
        /// Age in days after which an anonymous cart row is stale
        #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,
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
            CartsAction::Prune { days } => {
                commands::carts::prune(days).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_defaults_to_thirty_days() {
        let cli = Cli::try_parse_from(["toko-cli", "carts", "prune"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Carts {
                action: CartsAction::Prune { days: 30 }
            }
        ));
    }

    #[test]
    fn test_prune_rejects_zero_days() {
        assert!(Cli::try_parse_from(["toko-cli", "carts", "prune", "--days", "0"]).is_err());
    }

    #[test]
    fn test_migrate_parses() {
        let cli = Cli::try_parse_from(["toko-cli", "migrate"]).unwrap();
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
