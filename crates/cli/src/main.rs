//! Sanital CLI - local cart and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the local cart
//! sanital cart show
//!
//! # Add two units of a product (snapshotted from the backend catalog)
//! sanital cart add P1 -q 2
//!
//! # Set, remove, clear
//! sanital cart set P1 5
//! sanital cart remove P1
//! sanital cart clear
//!
//! # Browse the catalog
//! sanital catalog list --category Detergenti
//! sanital catalog search sgrassatore
//! sanital catalog categories
//!
//! # Import a catalog CSV as an admin (password from SANITAL_ADMIN_PASSWORD)
//! sanital catalog import products.csv --email admin@sanital.it
//! ```
//!
//! # Environment Variables
//!
//! - `SANITAL_API_URL` - Backend base URL (catalog commands and `cart add`)
//! - `SANITAL_CART_DIR` - Directory holding the local cart (default `./data/carts`)
//! - `SANITAL_CART_KEY` - Storage key of the local cart (default `sanital_cart`)
//! - `SANITAL_ADMIN_PASSWORD` - Admin password for `catalog import`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sanital_core::cart::persist::DEFAULT_STORAGE_KEY;
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "sanital")]
#[command(author, version, about = "Sanital CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the local cart
    Cart {
        /// Directory holding the cart file
        #[arg(long, env = "SANITAL_CART_DIR", default_value = "./data/carts")]
        dir: PathBuf,

        /// Storage key of the cart
        #[arg(long, env = "SANITAL_CART_KEY", default_value = DEFAULT_STORAGE_KEY)]
        key: String,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Browse and import the catalog
    Catalog {
        /// Backend base URL
        #[arg(long, env = "SANITAL_API_URL")]
        api_url: Url,

        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product from the catalog
    Add {
        /// Product id
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,

        /// Backend base URL
        #[arg(long, env = "SANITAL_API_URL")]
        api_url: Url,
    },
    /// Set a line's quantity (zero or less removes it)
    Set {
        /// Product id
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Search product names and descriptions
    Search {
        /// Search text (at least three characters)
        query: String,

        /// Maximum results
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// List categories with product counts
    Categories,
    /// Upload a catalog CSV as an admin
    Import {
        /// Path to the CSV file
        file: PathBuf,

        /// Admin email
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sanital=info,sanital_storefront=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { dir, key, action } => {
            let mut cart = commands::cart::open(&dir, &key)?;
            match action {
                CartAction::Show => {}
                CartAction::Add {
                    id,
                    quantity,
                    api_url,
                } => commands::cart::add(&mut cart, api_url, &id, quantity).await?,
                CartAction::Set { id, quantity } => commands::cart::set(&mut cart, &id, quantity),
                CartAction::Remove { id } => commands::cart::remove(&mut cart, &id),
                CartAction::Clear => commands::cart::clear(&mut cart),
            }
            commands::cart::show(&cart);
        }
        Commands::Catalog { api_url, action } => {
            let backend = commands::catalog::client(api_url)?;
            match action {
                CatalogAction::List { category } => {
                    commands::catalog::list(&backend, category.as_deref()).await?;
                }
                CatalogAction::Search { query, limit } => {
                    commands::catalog::search(&backend, &query, limit).await?;
                }
                CatalogAction::Categories => commands::catalog::categories(&backend).await?,
                CatalogAction::Import { file, email } => {
                    commands::catalog::import(&backend, &file, &email).await?;
                }
            }
        }
    }
    Ok(())
}
