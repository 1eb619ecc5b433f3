//! MyBookstore CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! mbs-cli migrate
//!
//! # Create a back-office user (temporary password printed once)
//! mbs-cli admin create -e agent@example.com -f Jane -l Doe -r agent
//!
//! # Seed demo catalogue data
//! mbs-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mbs-cli")]
#[command(author, version, about = "MyBookstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage back-office users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed demo catalogue data
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new back-office user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Role (`agent` or `admin`)
        #[arg(short, long, default_value = "agent")]
        role: String,
    },
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                first_name,
                last_name,
                role,
            } => {
                commands::admin::create_user(&email, &first_name, &last_name, &role).await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}
