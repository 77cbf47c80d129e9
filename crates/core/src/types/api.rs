//! Request and response bodies of the cart REST API.
//!
//! Shared by the storefront handlers and the client sync layer so both ends
//! agree on the JSON shape.

use serde::{Deserialize, Serialize};

use super::cart::LineItem;
use super::id::{CartId, LineItemId, ProductId};
use crate::pricing::PriceSummary;

/// `POST /cart/items`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Client-chosen ID for a new line. Ignored when the product already has
    /// a line in the cart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_item_id: Option<LineItemId>,
}

/// `PATCH /cart/items/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// `GET /cart`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    /// `None` until the session's first add-to-cart.
    pub cart_id: Option<CartId>,
    pub items: Vec<LineItem>,
    pub summary: PriceSummary,
}
