//! ShopFlow CLI - catalog and cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # List in-stock electronics, cheapest first
//! shopflow products list --category Electronics --in-stock --sort price-low
//!
//! # Add two medium white shirts to the cart
//! shopflow cart add 4 --quantity 2 --size M --color White
//!
//! # Check a catalog seed file before deploying it
//! shopflow seed check data/products.json
//! ```
//!
//! The CLI reads the same environment as the storefront server, so with the
//! local backend it shares the server's cart file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use shopflow_storefront::config::StorefrontConfig;
use shopflow_storefront::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "shopflow")]
#[command(author, version, about = "ShopFlow catalog and cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// List categories with product counts
    Categories,
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Work with catalog seed files
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products matching the filters
    List(ListArgs),
    /// Show one product with its variants
    Show {
        /// Product ID
        id: i32,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Text to find in names, descriptions and categories
    #[arg(short, long)]
    search: Option<String>,

    /// Category name (case-insensitive)
    #[arg(short, long)]
    category: Option<String>,

    /// Lowest price to include
    #[arg(long)]
    min_price: Option<Decimal>,

    /// Highest price to include
    #[arg(long)]
    max_price: Option<Decimal>,

    /// Only in-stock products
    #[arg(long)]
    in_stock: bool,

    /// Only featured products
    #[arg(long)]
    featured: bool,

    /// `featured`, `price-low`, `price-high` or `name`
    #[arg(long, default_value = "featured")]
    sort: String,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart lines and totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: i32,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Variant size
        #[arg(long)]
        size: Option<String>,

        /// Variant color
        #[arg(long)]
        color: Option<String>,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        /// Cart line ID
        line_id: i64,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        line_id: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum SeedAction {
    /// Validate a catalog seed file
    Check {
        /// Path to the JSON seed file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn state() -> Result<AppState, Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    Ok(AppState::from_config(config).await?)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List(args) => commands::catalog::list(&state().await?, args).await?,
            ProductAction::Show { id } => commands::catalog::show(&state().await?, id).await?,
        },
        Commands::Categories => commands::catalog::categories(&state().await?).await?,
        Commands::Cart { action } => {
            let state = state().await?;
            match action {
                CartAction::Show => commands::cart::show(&state).await?,
                CartAction::Add {
                    product_id,
                    quantity,
                    size,
                    color,
                } => {
                    commands::cart::add(&state, product_id, quantity, size.as_deref(), color.as_deref())
                        .await?;
                }
                CartAction::Update { line_id, quantity } => {
                    commands::cart::update(&state, line_id, quantity).await?;
                }
                CartAction::Remove { line_id } => commands::cart::remove(&state, line_id).await?,
                CartAction::Clear => commands::cart::clear(&state).await?,
            }
        }
        Commands::Seed { action } => match action {
            SeedAction::Check { file } => commands::seed::check(&file).await?,
        },
    }
    Ok(())
}
