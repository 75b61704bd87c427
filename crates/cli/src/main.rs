//! Tessera CLI - migrations, fidelity import and loyalty management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tessera migrate
//!
//! # Load the fidelity export (or just count what would be loaded)
//! tessera import data/fidelity.json
//! tessera import data/fidelity.json --dry-run
//!
//! # Look up a physical card, then migrate it to a new account
//! tessera check 2020000028284 --surname Abatangelo
//! tessera migrate-card 2020000028284 --surname Abatangelo -e chiara@example.it -p secret123
//!
//! # Stores and cashiers
//! tessera store create -n "Centro" -a "Via Roma 1, Milano"
//! tessera cashier create --store 1 -n "Cassa 1"
//!
//! # Create admin user
//! tessera admin create -e admin@example.com -n "Admin Name" -r super_admin -p secret123
//! ```
//!
//! Every command prints its result as JSON on stdout; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tessera_backend::{AppError, BackendConfig, ConfigError};
use tessera_core::{CashierId, StoreId, UserProfileId};

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Tessera loyalty backend tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import the bulk fidelity export
    Import {
        /// Export file (defaults to `TESSERA_FIDELITY_EXPORT`)
        file: Option<PathBuf>,

        /// Parse and count without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Look up a physical card
    Check {
        /// Physical card number
        tessera: String,

        /// Surname of the card holder
        #[arg(short, long)]
        surname: Option<String>,
    },
    /// Register a new account
    Register(RegisterArgs),
    /// Migrate a physical card to a new account
    MigrateCard {
        /// Physical card number
        tessera: String,

        /// Surname of the card holder
        #[arg(short, long)]
        surname: Option<String>,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Verify account credentials
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Check a dashboard account instead of a customer account
        #[arg(long)]
        admin: bool,
    },
    /// Manage stores
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Manage cashiers
    Cashier {
        #[command(subcommand)]
        action: CashierAction,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Credit or redeem points
    Points {
        #[command(subcommand)]
        action: PointsAction,
    },
}

#[derive(clap::Args)]
struct RegisterArgs {
    #[arg(short, long)]
    email: String,

    #[arg(short, long)]
    password: String,

    /// Physical card already held by the customer
    #[arg(short, long)]
    tessera: Option<String>,

    #[arg(long, default_value = "")]
    nome: String,

    #[arg(long, default_value = "")]
    cognome: String,

    #[arg(long, default_value = "")]
    telefono: String,

    /// Extra profile fields as a JSON object, e.g. '{"localita":"MILANO","vegano":"1"}'
    #[arg(long)]
    profile: Option<String>,
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create a store
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        address: String,
    },
    /// List stores
    List,
    /// Show one store
    Show { id: StoreId },
    /// Delete a store and its cashiers
    Delete { id: StoreId },
}

#[derive(Subcommand)]
enum CashierAction {
    /// Create a cashier
    Create {
        #[arg(short, long)]
        store: StoreId,

        #[arg(short, long)]
        name: String,
    },
    /// List the cashiers of a store
    List {
        #[arg(short, long)]
        store: StoreId,
    },
    /// Delete a cashier
    Delete { id: CashierId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        #[arg(short, long)]
        password: String,
    },
    /// List admin users
    List,
}

#[derive(Subcommand)]
enum PointsAction {
    /// Add points to a balance
    Credit { user: UserProfileId, amount: i64 },
    /// Spend points on a reward
    Redeem { user: UserProfileId, cost: i64 },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Loaded before tracing so Sentry can be initialized first
    let config = BackendConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(telemetry::init_sentry);
    telemetry::init_tracing();

    if let Err(e) = run(cli, config).await {
        e.report();
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Result<BackendConfig, ConfigError>) -> Result<(), AppError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(&config?).await,
        Commands::Import { file, dry_run } => {
            commands::import::run(config, file, dry_run).await
        }
        Commands::Check { tessera, surname } => {
            commands::cards::check(&config?, &tessera, surname.as_deref()).await
        }
        Commands::Register(args) => commands::cards::register(&config?, args).await,
        Commands::MigrateCard {
            tessera,
            surname,
            email,
            password,
        } => {
            commands::cards::migrate_card(&config?, &tessera, surname.as_deref(), &email, &password)
                .await
        }
        Commands::Login {
            email,
            password,
            admin,
        } => commands::admin::login(&config?, &email, &password, admin).await,
        Commands::Store { action } => {
            let config = config?;
            match action {
                StoreAction::Create { name, address } => {
                    commands::directory::create_store(&config, &name, &address).await
                }
                StoreAction::List => commands::directory::list_stores(&config).await,
                StoreAction::Show { id } => commands::directory::show_store(&config, id).await,
                StoreAction::Delete { id } => commands::directory::delete_store(&config, id).await,
            }
        }
        Commands::Cashier { action } => {
            let config = config?;
            match action {
                CashierAction::Create { store, name } => {
                    commands::directory::create_cashier(&config, store, &name).await
                }
                CashierAction::List { store } => {
                    commands::directory::list_cashiers(&config, store).await
                }
                CashierAction::Delete { id } => {
                    commands::directory::delete_cashier(&config, id).await
                }
            }
        }
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => commands::admin::create_user(&config?, &email, &name, &role, &password).await,
            AdminAction::List => commands::admin::list_users(&config?).await,
        },
        Commands::Points { action } => {
            let config = config?;
            match action {
                PointsAction::Credit { user, amount } => {
                    commands::points::credit(&config, user, amount).await
                }
                PointsAction::Redeem { user, cost } => {
                    commands::points::redeem(&config, user, cost).await
                }
            }
        }
    }
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
    fn test_parse_import_dry_run() {
        let cli = Cli::try_parse_from(["tessera", "import", "fidelity.json", "--dry-run"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Import { file: Some(_), dry_run: true })
        ));
    }

    #[test]
    fn test_parse_store_ids() {
        let cli = Cli::try_parse_from(["tessera", "cashier", "create", "--store", "7", "-n", "Cassa"]);
        match cli.map(|c| c.command) {
            Ok(Commands::Cashier {
                action: CashierAction::Create { store, name },
            }) => {
                assert_eq!(store, StoreId::new(7));
                assert_eq!(name, "Cassa");
            }
            _ => panic!("expected cashier create"),
        }

        assert!(Cli::try_parse_from(["tessera", "store", "delete", "seven"]).is_err());
    }

    #[test]
    fn test_parse_check_without_surname() {
        let cli = Cli::try_parse_from(["tessera", "check", "2020000028284"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Check { surname: None, .. })
        ));
    }
}
