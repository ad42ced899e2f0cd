//! # Shelf POS Application Library
//!
//! State objects, commands and the command-line front end for the
//! bookstore point of sale. Any UI (desktop shell, web server, the bundled
//! CLI) drives the system through [`commands`].
//!
//! ## Module Organization
//! ```text
//! shelf_pos/
//! ├── lib.rs          ◄─── You are here (startup & CLI dispatch)
//! ├── cli.rs          ◄─── clap subcommands
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database wrapper + admin sessions
//! │   ├── cart.rs     ◄─── Draft sale behind Arc<Mutex>
//! │   ├── catalog.rs  ◄─── Book store
//! │   ├── customers.rs◄─── Customer store
//! │   ├── ledger.rs   ◄─── Sales ledger
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── book.rs     ◄─── Catalog commands
//! │   ├── customer.rs ◄─── Customer commands
//! │   ├── cart.rs     ◄─── Cart commands
//! │   ├── sale.rs     ◄─── Checkout and history
//! │   ├── report.rs   ◄─── Dashboard and reports
//! │   └── config.rs   ◄─── Configuration retrieval
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, written to stderr             │
//! │     • Default: info,shelf=debug,sqlx=warn; RUST_LOG overrides           │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • ConfigState::from_env() (SHELF_* variables over defaults)         │
//! │                                                                         │
//! │  3. Determine Database Path ──────────────────────────────────────────► │
//! │     • SHELF_DB_PATH, or the platform data directory                     │
//! │                                                                         │
//! │  4. Connect to Database ──────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, pending migrations applied                  │
//! │                                                                         │
//! │  5. Build State Objects, load the stores the command needs ──────────► │
//! │                                                                         │
//! │  6. Run the command, print JSON (or a receipt) to stdout ────────────► │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Serialize;
use shelf_core::query::{BookFilter, BookSort, CustomerSort, SortDirection};
use shelf_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::book::BookQuery;
use commands::customer::CustomerQuery;
use commands::report::RangeRequest;
use commands::sale::CompleteSaleRequest;
use state::{CartState, CatalogStore, ConfigState, CustomerStore, DbState, SalesLedger};

/// Runs one parsed CLI command.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ConfigState::from_env();
    let db_path = get_database_path(&config)?;
    info!(?db_path, "Database path determined");

    let db = DbState::new(Database::new(DbConfig::new(db_path)).await?);
    let (total, applied) = db.inner().migration_status().await?;
    info!(total, applied, "Database connected and migrations applied");

    let result = dispatch(&db, &config, cli.command).await;
    db.inner().close().await;
    result
}

async fn dispatch(
    db: &DbState,
    config: &ConfigState,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = config.admin_user.as_str();
    let cart = CartState::new(config.tax_rate());
    let catalog = CatalogStore::new();
    let customers = CustomerStore::new();
    let ledger = SalesLedger::new();

    match command {
        Command::Dashboard { days } => {
            commands::book::load_catalog(db, &catalog, user).await?;
            commands::sale::load_sales(db, &ledger, user).await?;
            let dashboard = commands::report::get_dashboard(
                db,
                &catalog,
                &ledger,
                config,
                user,
                RangeRequest::LastDays { days },
            )
            .await?;
            print_json(&dashboard)
        }
        Command::Inventory => {
            commands::book::load_catalog(db, &catalog, user).await?;
            print_json(&commands::report::get_inventory_report(db, &catalog, config, user).await?)
        }
        Command::LowStock => {
            commands::book::load_catalog(db, &catalog, user).await?;
            let query = BookQuery {
                filter: BookFilter {
                    low_stock_only: true,
                    ..Default::default()
                },
                sort: BookSort::Stock,
                direction: SortDirection::Asc,
                page: commands::PageRequest {
                    page: Some(1),
                    page_size: Some(shelf_core::query::MAX_PAGE_SIZE),
                },
            };
            print_json(&commands::book::list_books(db, &catalog, config, user, query).await?)
        }
        Command::Sales { days } => {
            let sales =
                commands::sale::list_sales(db, user, RangeRequest::LastDays { days }).await?;
            print_json(&sales)
        }
        Command::Customers => {
            commands::customer::load_customers(db, &customers, user).await?;
            commands::sale::load_sales(db, &ledger, user).await?;
            let query = CustomerQuery {
                sort: CustomerSort::TotalSpent,
                direction: SortDirection::Desc,
                ..Default::default()
            };
            print_json(
                &commands::customer::list_customers(db, &customers, &ledger, user, query).await?,
            )
        }
        Command::Sell {
            book_id,
            quantity,
            paid_cents,
            method,
        } => {
            commands::book::load_catalog(db, &catalog, user).await?;
            commands::cart::add_to_cart(&catalog, &cart, &book_id, quantity)?;
            let view = commands::cart::set_cart_payment_method(&cart, method);

            let receipt = commands::sale::complete_sale(
                db,
                &cart,
                &catalog,
                &customers,
                &ledger,
                config,
                user,
                CompleteSaleRequest {
                    amount_paid_cents: paid_cents.unwrap_or(view.totals.total_cents),
                    new_customer: None,
                },
            )
            .await?;
            print!("{}", receipt.render(config));
            Ok(())
        }
        Command::GrantAdmin { user_id } => {
            db.inner().grant_admin(&user_id).await?;
            println!("granted administrator: {}", user_id);
            Ok(())
        }
        Command::RevokeAdmin { user_id } => {
            if db.inner().revoke_admin(&user_id).await? {
                println!("revoked administrator: {}", user_id);
            } else {
                println!("{} was not an administrator", user_id);
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shelf_db=trace` - Show trace for one crate
/// - Default: `info,shelf=debug,sqlx=warn`
///
/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shelf=debug,sqlx=warn"));

    // A subscriber may already be installed when embedded in a host app
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.shelf.pos/shelf.db`
/// - **Windows**: `%APPDATA%\shelf\pos\data\shelf.db`
/// - **Linux**: `~/.local/share/pos/shelf.db`
///
/// ## Override
/// `SHELF_DB_PATH` (via [`ConfigState::db_path`]) wins when set.
pub fn get_database_path(config: &ConfigState) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &config.db_path {
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "shelf", "pos")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("shelf.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_override() {
        let config = ConfigState {
            db_path: Some(PathBuf::from("/tmp/override.db")),
            ..ConfigState::default()
        };
        assert_eq!(
            get_database_path(&config).unwrap(),
            PathBuf::from("/tmp/override.db")
        );
    }

    #[tokio::test]
    async fn test_dispatch_sell_and_report() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ConfigState::default();
        db.grant_admin(&config.admin_user).await.unwrap();
        let db = DbState::new(db);

        let catalog = CatalogStore::new();
        let book = commands::book::create_book(
            &db,
            &catalog,
            &config.admin_user,
            shelf_core::NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: None,
                genre: "Science Fiction".to_string(),
                price_cents: 1000,
                stock: 3,
            },
        )
        .await
        .unwrap();

        let sell = Command::Sell {
            book_id: book.id.clone(),
            quantity: 2,
            paid_cents: None,
            method: shelf_core::PaymentMethod::Cash,
        };
        dispatch(&db, &config, sell).await.unwrap();
        dispatch(&db, &config, Command::Dashboard { days: 1 })
            .await
            .unwrap();

        let stored = commands::book::get_book(&db, &config.admin_user, &book.id)
            .await
            .unwrap();
        assert_eq!(stored.stock, 1);

        let too_many = Command::Sell {
            book_id: book.id,
            quantity: 2,
            paid_cents: None,
            method: shelf_core::PaymentMethod::Cash,
        };
        assert!(dispatch(&db, &config, too_many).await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_admin_commands() {
        let db = DbState::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let config = ConfigState::default();

        let grant = Command::GrantAdmin {
            user_id: "clerk".to_string(),
        };
        dispatch(&db, &config, grant).await.unwrap();
        assert!(db.session("clerk").await.is_ok());

        let revoke = Command::RevokeAdmin {
            user_id: "clerk".to_string(),
        };
        dispatch(&db, &config, revoke.clone()).await.unwrap();
        assert!(db.session("clerk").await.is_err());

        // Revoking again is not an error
        dispatch(&db, &config, revoke).await.unwrap();
    }
}
