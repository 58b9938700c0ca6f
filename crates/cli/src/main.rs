//! Habit Tracker CLI - Operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Check that FIREBASE_PRIVATE_KEY normalizes to a usable RSA key
//! habit-cli credentials check
//!
//! # Mint a Firebase custom token for local testing
//! habit-cli token mint --uid test-user --email u1@example.com
//!
//! # Insert habits from a YAML file
//! habit-cli seed demos/habits.yaml
//! ```
//!
//! # Commands
//!
//! - `credentials check` - Validate service account key material
//! - `token mint` - Mint a custom token from the service account
//! - `seed` - Seed the habit store from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "habit-cli")]
#[command(author, version, about = "Habit tracker CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect service account key material
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
    /// Firebase custom tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Seed the habit store from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,

        /// Validate the file without writing to the store
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum CredentialsAction {
    /// Normalize `FIREBASE_PRIVATE_KEY` and report what was found
    Check,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Mint a custom token signed by the service account
    Mint {
        /// Firebase user id (1 to 128 characters)
        #[arg(short, long)]
        uid: String,

        /// Email to embed as a developer claim
        #[arg(short, long)]
        email: Option<String>,
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
        Commands::Credentials { action } => match action {
            CredentialsAction::Check => commands::credentials::check()?,
        },
        Commands::Token { action } => match action {
            TokenAction::Mint { uid, email } => {
                commands::token::mint(&uid, email.as_deref())?;
            }
        },
        Commands::Seed { file, dry_run } => commands::seed::habits(&file, dry_run).await?,
    }
    Ok(())
}
