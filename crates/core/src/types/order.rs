//! Order confirmation produced by checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::LineItem;
use super::id::{CartId, OrderId};
use crate::pricing::PriceSummary;

/// A placed order, as returned to the shopper after checkout.
///
/// Items and totals are frozen at placement time from the cart's snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub cart_id: CartId,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub summary: PriceSummary,
}
