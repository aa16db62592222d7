//! Abacus CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! abacus migrate
//!
//! # Evaluate a calculation without the server
//! abacus compute subtraction 10 3 2
//!
//! # Delete an account and its calculations
//! abacus user delete -e ada@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "abacus")]
#[command(author, version, about = "Abacus CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Evaluate a calculation locally
    Compute {
        /// Operation name (addition, subtraction, multiplication, division)
        operation: String,

        /// Ordered inputs
        #[arg(required = true, allow_negative_numbers = true)]
        inputs: Vec<f64>,
    },
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Delete an account and every calculation it owns
    Delete {
        /// Account email address
        #[arg(short, long)]
        email: String,
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
        Commands::Compute { operation, inputs } => {
            let result = commands::compute::run(&operation, &inputs)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{result}");
            }
        }
        Commands::User { action } => match action {
            UserAction::Delete { email } => {
                let removed = commands::user::delete(&email).await?;
                #[allow(clippy::print_stdout)]
                {
                    println!("Deleted {email} and {removed} calculation(s)");
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compute_accepts_negative_inputs() {
        let cli = Cli::try_parse_from(["abacus", "compute", "add", "-1.5", "2"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Compute { ref inputs, .. }) if inputs == &[-1.5, 2.0]
        ));
    }
}
