//! SportGear CLI - terminal front-end for the storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in; the session persists under ~/.sportgear
//! sg-cli login -e ana@sportgear.co -p secret
//!
//! # Browse the catalog
//! sg-cli products search running --category Footwear --max-price 90000
//!
//! # Buy two of product 3 and one of product 7
//! sg-cli checkout --item 3:2 --item 7 --address "Calle 10 #5-20" --method credit_card
//!
//! # Open a shipment for order 101 as an operator
//! sg-cli shipments create --order 101 --tracking SG-0042 --carrier Servientrega
//!
//! # Follow shipments as an operator until Ctrl-C
//! sg-cli shipments watch --status in_transit
//! ```
//!
//! # Environment Variables
//!
//! - `SPORTGEAR_ENV` - `development` (default) or `production`
//! - `SPORTGEAR_ORIGIN` - public origin in production
//! - `SPORTGEAR_AUTH_API_URL`, `SPORTGEAR_BUSINESS_API_URL`,
//!   `SPORTGEAR_SHIPMENT_API_URL`, `SPORTGEAR_USER_API_URL` - per-backend overrides
//! - `SPORTGEAR_STATE_DIR` - where the session is kept
//! - `SENTRY_DSN` - enables error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use sportgear_core::{AccountStatus, OrderId, ProductId, Role, ShipmentId, ShipmentStatus, UserId};
use sportgear_storefront::config::StorefrontConfig;
use sportgear_storefront::models::PaymentMethod;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::AppError;

#[derive(Parser)]
#[command(name = "sg-cli")]
#[command(author, version, about = "SportGear storefront from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,

        /// Date of birth, `YYYY-MM-DD`
        #[arg(long)]
        birth_date: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Change your password
    Password {
        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },
    /// Update your name, phone and date of birth
    Profile {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,

        /// Date of birth, `YYYY-MM-DD`
        #[arg(long)]
        birth_date: Option<String>,
    },
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Order history and order management
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Shipment tracking and logistics
    Shipments {
        #[command(subcommand)]
        action: ShipmentAction,
    },
    /// Account administration
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Order and pay for a list of products
    Checkout {
        /// Product to buy as `ID` or `ID:QUANTITY`; repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        #[arg(short, long)]
        address: String,

        /// `credit_card`, `debit_card`, `paypal` or `bank_transfer`
        #[arg(short, long, default_value = "credit_card")]
        method: PaymentMethod,
    },
    /// Check whether the signed-in user may open a screen
    Access {
        /// Route path, e.g. `/admin/users`
        route: String,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List the whole catalog
    List,
    /// Keep the catalog on screen for product management until Ctrl-C
    Watch,
    /// Show one product
    Show { id: ProductId },
    /// Add a product to the catalog
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        price: Decimal,

        #[arg(long)]
        category: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        sport: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        /// Units on hand; 0 lists the product as sold out
        #[arg(long, default_value_t = 0)]
        stock: i64,
    },
    /// Change a product's details or stock
    Update {
        id: ProductId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        price: Option<Decimal>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        stock: Option<i64>,
    },
    /// Remove a product from the catalog
    Delete { id: ProductId },
    /// Search the catalog
    Search {
        query: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        sport: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        min_price: Option<Decimal>,

        #[arg(long)]
        max_price: Option<Decimal>,

        #[arg(long)]
        in_stock: bool,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders (all orders for operators, otherwise your own)
    List {
        /// Only your own orders, even as an operator
        #[arg(long)]
        mine: bool,
    },
    /// Keep the order list refreshed until Ctrl-C
    Watch {
        #[arg(long)]
        mine: bool,
    },
    /// Cancel an order
    Cancel { id: OrderId },
}

#[derive(Subcommand)]
enum ShipmentAction {
    /// List shipments
    List {
        #[arg(long)]
        status: Option<ShipmentStatus>,
    },
    /// Open a shipment for an order
    Create {
        #[arg(long = "order")]
        order_id: OrderId,

        #[arg(long = "tracking")]
        tracking_number: Option<String>,

        #[arg(long)]
        carrier: Option<String>,

        #[arg(long)]
        vehicle: Option<String>,
    },
    /// Look a shipment up by tracking number
    Track { tracking_number: String },
    /// Move a shipment to its next status
    Advance {
        id: ShipmentId,

        /// Vehicle carrying the shipment; used when it goes in transit
        #[arg(long)]
        vehicle: Option<String>,
    },
    /// Keep the shipment list refreshed until Ctrl-C
    Watch {
        #[arg(long)]
        status: Option<ShipmentStatus>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List accounts
    List {
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        role: Option<Role>,

        #[arg(long)]
        status: Option<AccountStatus>,
    },
    /// Change the role of an account
    SetRole { id: String, role: Role },
    /// Change the status of an account
    SetStatus { id: String, status: AccountStatus },
    /// Account counts by role and status
    Stats,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            report(&AppError::Config(e));
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sportgear_storefront=warn,sportgear_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        report(&e);
        std::process::exit(1);
    }
}

#[allow(clippy::print_stderr)]
fn report(error: &AppError) {
    eprintln!("error: {error}");
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let mut shop = sportgear_storefront::Storefront::new(config)?;
    shop.restore().await;

    let result = match cli.command {
        Commands::Login { email, password } => commands::account::login(&mut shop, &email, password).await,
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            phone,
            birth_date,
        } => {
            commands::account::register(
                &mut shop,
                commands::account::RegisterArgs {
                    email,
                    password,
                    first_name,
                    last_name,
                    phone,
                    birth_date,
                },
            )
            .await
        }
        Commands::Logout => commands::account::logout(&mut shop).await,
        Commands::Whoami => commands::account::whoami(&shop),
        Commands::Password { current, new } => commands::account::password(&shop, current, new).await,
        Commands::Profile {
            first_name,
            last_name,
            phone,
            birth_date,
        } => {
            let update = sportgear_storefront::models::ProfileUpdate {
                first_name,
                last_name,
                phone_number: phone.unwrap_or_default(),
                date_of_birth: birth_date.unwrap_or_default(),
            };
            commands::account::profile(&mut shop, &update).await
        }
        Commands::Access { route } => commands::account::access(&shop, &route),
        Commands::Products { action } => match action {
            ProductAction::List => commands::catalog::list(&shop).await,
            ProductAction::Watch => commands::catalog::watch(&shop).await,
            ProductAction::Show { id } => commands::catalog::show(&shop, id).await,
            ProductAction::Create {
                name,
                price,
                category,
                description,
                brand,
                sport,
                gender,
                stock,
            } => {
                let product = commands::catalog::NewProduct {
                    name,
                    price,
                    category,
                    description,
                    brand,
                    sport,
                    gender,
                    stock,
                };
                commands::catalog::create(&shop, product).await
            }
            ProductAction::Update {
                id,
                name,
                price,
                category,
                description,
                stock,
            } => {
                let changes = commands::catalog::ProductChanges {
                    name,
                    price,
                    category,
                    description,
                    stock,
                };
                commands::catalog::update(&shop, id, changes).await
            }
            ProductAction::Delete { id } => commands::catalog::delete(&shop, id).await,
            ProductAction::Search {
                query,
                category,
                brand,
                sport,
                gender,
                min_price,
                max_price,
                in_stock,
            } => {
                let filters = sportgear_storefront::models::ProductFilters {
                    query,
                    category,
                    brand,
                    sport,
                    gender,
                    min_price,
                    max_price,
                    in_stock_only: in_stock,
                };
                commands::catalog::search(&shop, &filters).await
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::List { mine } => commands::orders::list(&shop, mine).await,
            OrderAction::Watch { mine } => commands::orders::watch(&shop, mine).await,
            OrderAction::Cancel { id } => commands::orders::cancel(&shop, id).await,
        },
        Commands::Shipments { action } => match action {
            ShipmentAction::List { status } => commands::shipments::list(&shop, status).await,
            ShipmentAction::Create {
                order_id,
                tracking_number,
                carrier,
                vehicle,
            } => commands::shipments::create(&shop, order_id, tracking_number, carrier, vehicle).await,
            ShipmentAction::Track { tracking_number } => {
                commands::shipments::track(&shop, &tracking_number).await
            }
            ShipmentAction::Advance { id, vehicle } => {
                commands::shipments::advance(&shop, id, vehicle).await
            }
            ShipmentAction::Watch { status } => commands::shipments::watch(&shop, status).await,
        },
        Commands::Users { action } => match action {
            UserAction::List { search, role, status } => {
                let filters = sportgear_storefront::models::UserFilters { search, role, status };
                commands::users::list(&shop, &filters).await
            }
            UserAction::SetRole { id, role } => commands::users::set_role(&shop, &UserId::from(id), role).await,
            UserAction::SetStatus { id, status } => {
                commands::users::set_status(&shop, &UserId::from(id), status).await
            }
            UserAction::Stats => commands::users::stats(&shop).await,
        },
        Commands::Checkout {
            items,
            address,
            method,
        } => commands::checkout::run(&mut shop, &items, address, method).await,
    };

    if shop.end_session_if_expired().await {
        tracing::warn!("Your session has expired. Please sign in again.");
    }
    result
}
