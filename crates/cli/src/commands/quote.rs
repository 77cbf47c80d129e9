//! Price a cart offline against a catalog file.
//!
//! Runs the same cart and pricing rules as the storefront, which makes it
//! handy for checking a pricing change before rolling it out.

use std::path::Path;

use thiserror::Error;
use tracing::info;
use verdant_core::{
    Cart, CartError, LineItemId, PriceSummary, PricingPolicy, ProductId, format_amount, summarize,
};
use verdant_storefront::catalog::Catalog;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Parse `<product-id>:<quantity>`, e.g. `42:2`. A bare ID means quantity 1.
///
/// # Errors
///
/// Returns a message if either part is not a number.
pub fn parse_item(raw: &str) -> Result<(ProductId, u32), String> {
    let (id, quantity) = raw.split_once(':').unwrap_or((raw, "1"));
    let id = id
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid product id '{id}': {e}"))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
    Ok((ProductId::new(id), quantity))
}

/// Build a cart from `items` and price it.
///
/// Items go through the same merge, stock clamp and validation as a
/// storefront add-to-cart.
///
/// # Errors
///
/// Returns an error for unknown products, zero quantities or out-of-stock
/// products.
pub fn build_quote(
    catalog: &Catalog,
    items: &[(ProductId, u32)],
    policy: &PricingPolicy,
) -> Result<(Cart, PriceSummary), QuoteError> {
    let mut cart = Cart::new();
    for &(product_id, quantity) in items {
        let product = catalog
            .product(product_id)
            .ok_or(QuoteError::UnknownProduct(product_id))?;
        cart.add(product, quantity, LineItemId::generate())?;
    }
    let summary = summarize(cart.items(), policy);
    Ok((cart, summary))
}

/// Load the catalog at `path`, price `items` and log the breakdown.
///
/// # Errors
///
/// Returns an error if the catalog is invalid or the cart cannot be built.
pub fn run(
    path: &Path,
    items: &[(ProductId, u32)],
    policy: &PricingPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load(path)?;
    let (cart, summary) = build_quote(&catalog, items, policy)?;
    let currency = summary.currency_code;

    for line in cart.items() {
        info!(
            "{:>3} x {:<40} {:>10}",
            line.quantity,
            line.product.name,
            format_amount(line.line_total(), currency)
        );
    }
    info!("Subtotal {:>10}", format_amount(summary.subtotal, currency));
    info!("Shipping {:>10}", format_amount(summary.shipping_fee, currency));
    info!("Tax      {:>10}", format_amount(summary.tax, currency));
    info!("Total    {:>10}", summary.display_total());
    if summary.shows_free_shipping_nudge() {
        info!(
            "Add {} more for free shipping",
            format_amount(summary.amount_to_free_shipping, currency)
        );
    }
    Ok(())
}
