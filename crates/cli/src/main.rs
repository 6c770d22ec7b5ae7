//! GoShop CLI - Database migrations and admin account tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending database migrations
//! goshop-cli migrate
//!
//! # Create an admin user
//! goshop-cli admin create -n "Admin Toko" -e admin@example.com -p 's3cret-pass'
//!
//! # Create the configured admin if the user table is empty
//! goshop-cli admin seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create an admin user
//! - `admin seed` - First-start admin seeding, same as the API does on boot

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "goshop-cli")]
#[command(author, version, about = "GoShop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(short, long)]
        password: String,
    },
    /// Create the admin from `GOSHOP_ADMIN_*` if no user exists yet
    Seed,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                email,
                password,
            } => {
                commands::admin::create_user(&name, &email, &password).await?;
            }
            AdminAction::Seed => commands::admin::seed().await?,
        },
    }
    Ok(())
}
