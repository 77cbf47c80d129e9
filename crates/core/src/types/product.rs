//! Catalog product records and the snapshot a cart keeps of them.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product as published by the catalog.
///
/// The cart never mutates products; it copies the fields it needs into a
/// [`ProductSnapshot`] at add-time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub compare_at_price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub sku: String,
    /// Units available, `None` when stock is not tracked.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Product {
    /// Capture the cart-relevant fields of this product.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            name: self.name.clone(),
            price: self.price,
            compare_at_price: self.compare_at_price,
            image_url: self.image_url.clone(),
            sku: self.sku.clone(),
        }
    }

    /// Whether the product is on sale (compare-at price above the price).
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .is_some_and(|compare| compare.amount > self.price.amount)
    }

    /// Whether the product can be added to a cart at all.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.stock != Some(0)
    }
}

/// Denormalized product fields stored on a line item.
///
/// The price here is the unit price at the moment the item was added and is
/// what the price calculator uses, regardless of later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub compare_at_price: Option<Price>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub sku: String,
}

/// A catalog category (e.g. "Houseplants", "Planters").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}
