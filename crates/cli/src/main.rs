//! Verdant CLI - catalog and content checks, offline cart quotes.
//!
//! # Usage
//!
//! ```bash
//! # Validate the product catalog
//! verdant-cli check catalog crates/storefront/content/catalog.json
//!
//! # Validate blog posts and static pages
//! verdant-cli check content crates/storefront/content
//!
//! # Price two snake plants and a pot
//! verdant-cli quote --catalog crates/storefront/content/catalog.json --item 42:2 --item 80
//! ```
//!
//! Pricing flags fall back to `CART_TAX_RATE`, `CART_FREE_SHIPPING_THRESHOLD`
//! and `CART_FLAT_SHIPPING_FEE`, then to the storefront defaults.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use verdant_core::{CurrencyCode, PricingPolicy, ProductId};

mod commands;

#[derive(Parser)]
#[command(name = "verdant-cli")]
#[command(author, version, about = "Verdant CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate storefront data files
    Check {
        #[command(subcommand)]
        target: CheckTarget,
    },
    /// Price a cart against a catalog file
    Quote {
        /// Path to `catalog.json`
        #[arg(short, long)]
        catalog: PathBuf,

        /// Item as `<product-id>:<quantity>`; repeat for more lines
        #[arg(short, long = "item", value_parser = commands::quote::parse_item, required = true)]
        items: Vec<(ProductId, u32)>,

        /// Sales tax rate as a fraction
        #[arg(long, env = "CART_TAX_RATE", default_value = "0.07")]
        tax_rate: Decimal,

        /// Subtotal from which shipping is free
        #[arg(long, env = "CART_FREE_SHIPPING_THRESHOLD", default_value = "50.00")]
        free_shipping_threshold: Decimal,

        /// Shipping fee below the threshold
        #[arg(long, env = "CART_FLAT_SHIPPING_FEE", default_value = "5.99")]
        flat_shipping_fee: Decimal,
    },
}

#[derive(Subcommand)]
enum CheckTarget {
    /// Validate a `catalog.json` file
    Catalog { path: PathBuf },
    /// Validate the `blog/` and `pages/` markdown under a content directory
    Content { dir: PathBuf },
}

fn main() {
    // Pricing defaults may come from the storefront's .env
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check { target } => match target {
            CheckTarget::Catalog { path } => commands::check::catalog(&path)?,
            CheckTarget::Content { dir } => commands::check::content(&dir)?,
        },
        Commands::Quote {
            catalog,
            items,
            tax_rate,
            free_shipping_threshold,
            flat_shipping_fee,
        } => {
            let policy = PricingPolicy::new(
                tax_rate,
                free_shipping_threshold,
                flat_shipping_fee,
                CurrencyCode::USD,
            )?;
            commands::quote::run(&catalog, &items, &policy)?;
        }
    }
    Ok(())
}
