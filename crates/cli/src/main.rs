//! Marketplace CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mp-cli migrate
//!
//! # Issue a bearer token for local testing
//! mp-cli token issue -u alice
//!
//! # Inspect or delete a user's cart
//! mp-cli cart show -u alice
//! mp-cli cart purge -u alice
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Issue bearer tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Inspect and maintain carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for a username
    Issue {
        /// Username to put in the token subject
        #[arg(short, long)]
        username: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print a user's cart as JSON
    Show {
        /// Owner of the cart
        #[arg(short, long)]
        username: String,
    },
    /// Delete a user's cart and its line items
    Purge {
        /// Owner of the cart
        #[arg(short, long)]
        username: String,
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Token { action } => match action {
            TokenAction::Issue { username } => commands::token::issue(&username)?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show { username } => commands::cart::show(&username).await?,
            CartAction::Purge { username } => commands::cart::purge(&username).await?,
        },
    }
    Ok(())
}
