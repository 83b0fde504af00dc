//! FitSupply CLI - storefront and admin client.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password read from stdin when omitted)
//! fitsupply login -u jdoe
//!
//! # Browse and fill the cart
//! fitsupply products list --category protein
//! fitsupply cart add whey-isolate --qty 2
//!
//! # Place an order
//! fitsupply checkout --address "1 Main St" --city Austin --state TX --zip 73301
//!
//! # Staff tools
//! fitsupply dashboard
//! fitsupply orders status 42 shipped
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `register` / `whoami` - Session management
//! - `products` - Browse the catalog
//! - `cart` - Inspect and edit the cart
//! - `checkout` - Place an order from the cart
//! - `orders` - Order history and status updates
//! - `admin` - Catalog management
//! - `dashboard` - Sales KPIs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use fitsupply_client::{ClientConfig, Store, TracingNavigator};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fitsupply")]
#[command(author, version, about = "FitSupply storefront and admin client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and load the server cart
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Upload pending cart edits and sign out
    Logout,
    /// Create an account, then sign in
    Register(commands::auth::RegisterArgs),
    /// Show the signed-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: commands::catalog::ProductsAction,
    },
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Place an order from the current cart
    Checkout(commands::checkout::CheckoutArgs),
    /// Order history and status updates
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
    /// Catalog management (staff)
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
    /// Sales KPIs, recent orders and the sales chart (staff)
    Dashboard,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fitsupply_client=info,fitsupply_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), commands::CommandError> {
    let store = Store::open(config, Arc::new(TracingNavigator))?;
    let phase = store.start_session().await;
    tracing::debug!(?phase, "Session started");

    let result = match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&store, &username, password).await
        }
        Commands::Logout => {
            store.sign_out().await;
            commands::auth::logged_out()
        }
        Commands::Register(args) => commands::auth::register(&store, args).await,
        Commands::Whoami => commands::auth::whoami(&store),
        Commands::Products { action } => commands::catalog::run(&store, action).await,
        Commands::Cart { action } => commands::cart::run(&store, action).await,
        Commands::Checkout(args) => commands::checkout::run(&store, args).await,
        Commands::Orders { action } => commands::orders::run(&store, action).await,
        Commands::Admin { action } => commands::admin::run(&store, action).await,
        Commands::Dashboard => commands::dashboard::run(&store).await,
    };

    // Pending cart edits must reach the server before the process exits.
    store.shutdown().await;
    result
}
