//! Cart and line item types.
//!
//! [`Cart`] owns its line items privately so that every mutation goes through
//! methods that uphold the two cart invariants:
//!
//! - every line item has a quantity of at least 1
//! - at most one line item per product
//!
//! Both the server-side cart repository and the client-side cart store use
//! these methods, so the invariants hold on both ends of the wire.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, LineItemId, ProductId};
use super::product::{Product, ProductSnapshot};
use crate::error::CartError;

/// One product-quantity pairing within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub product: ProductSnapshot,
}

impl LineItem {
    /// Snapshot unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.times(self.quantity)
    }
}

/// Reject quantities below 1.
///
/// # Errors
///
/// Returns `CartError::Validation` for a zero quantity.
pub fn validate_quantity(quantity: u32) -> Result<u32, CartError> {
    if quantity < 1 {
        return Err(CartError::Validation(
            "quantity must be at least 1; remove the item instead".to_string(),
        ));
    }
    Ok(quantity)
}

/// An ordered collection of line items, unique by product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCart")]
pub struct Cart {
    id: CartId,
    items: Vec<LineItem>,
}

/// Unvalidated wire form of a cart.
#[derive(Deserialize)]
struct RawCart {
    id: CartId,
    #[serde(default)]
    items: Vec<LineItem>,
}

impl TryFrom<RawCart> for Cart {
    type Error = CartError;

    fn try_from(raw: RawCart) -> Result<Self, Self::Error> {
        let mut cart = Self::with_id(raw.id);
        for item in raw.items {
            validate_quantity(item.quantity)?;
            if cart.find_product(item.product_id).is_some() {
                return Err(CartError::Validation(format!(
                    "duplicate line for product {}",
                    item.product_id
                )));
            }
            cart.items.push(item);
        }
        Ok(cart)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Create an empty cart with a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(CartId::generate())
    }

    /// Create an empty cart with the given ID.
    #[must_use]
    pub const fn with_id(id: CartId) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    /// Build a cart from existing line items, checking the cart invariants.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if a line has quantity 0 or two lines
    /// share a product.
    pub fn from_items(id: CartId, items: Vec<LineItem>) -> Result<Self, CartError> {
        Self::try_from(RawCart { id, items })
    }

    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn get(&self, id: LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn find_product(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Index of a line item, if present.
    #[must_use]
    pub fn position(&self, id: LineItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Add `quantity` units of `product`.
    ///
    /// If the product already has a line, its quantity is incremented and
    /// `new_id` is ignored. Otherwise a new line with `new_id` is appended.
    /// The resulting quantity is clamped to the product's stock when known,
    /// but never below what the line already holds.
    /// The snapshot of an existing line is kept as it was at first add.
    ///
    /// # Errors
    ///
    /// - `Validation` if `quantity` is 0
    /// - `ProductUnavailable` if the product's stock is known to be 0
    #[allow(clippy::indexing_slicing)] // index comes from `position` or the push
    pub fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        new_id: LineItemId,
    ) -> Result<&LineItem, CartError> {
        validate_quantity(quantity)?;
        if !product.is_available() {
            return Err(CartError::ProductUnavailable(product.id));
        }

        let clamp = |q: u32| product.stock.map_or(q, |stock| q.min(stock));

        let index = if let Some(index) = self
            .items
            .iter()
            .position(|item| item.product_id == product.id)
        {
            let line = &mut self.items[index];
            line.quantity = line
                .quantity
                .max(clamp(line.quantity.saturating_add(quantity)));
            index
        } else {
            self.items.push(LineItem {
                id: new_id,
                product_id: product.id,
                quantity: clamp(quantity),
                product: product.snapshot(),
            });
            self.items.len() - 1
        };

        Ok(&self.items[index])
    }

    /// Set the quantity of an existing line.
    ///
    /// No stock clamp is applied here: the caller asked for an exact value.
    ///
    /// # Errors
    ///
    /// - `Validation` if `quantity` is 0 (the line is left unchanged)
    /// - `NotFound` if the line is not in the cart
    pub fn set_quantity(
        &mut self,
        id: LineItemId,
        quantity: u32,
    ) -> Result<&LineItem, CartError> {
        validate_quantity(quantity)?;
        let line = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CartError::NotFound(id))?;
        line.quantity = quantity;
        Ok(line)
    }

    /// Remove a line. Returns the removed item, or `None` if it was absent.
    pub fn remove(&mut self, id: LineItemId) -> Option<LineItem> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Replace the line with the same ID. Returns `false` if no such line.
    ///
    /// A replacement with quantity 0 removes the line instead.
    pub fn replace(&mut self, item: LineItem) -> bool {
        let Some(index) = self.position(item.id) else {
            return false;
        };
        if item.quantity == 0 {
            self.items.remove(index);
        } else if let Some(slot) = self.items.get_mut(index) {
            *slot = item;
        }
        true
    }

    /// Put a previously removed line back at `index` (or at the end if the
    /// cart has shrunk since).
    ///
    /// Does nothing if the line or its product is already present, or if the
    /// item carries a zero quantity.
    pub fn restore(&mut self, index: usize, item: LineItem) {
        if item.quantity == 0
            || self.position(item.id).is_some()
            || self.find_product(item.product_id).is_some()
        {
            return;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::Price;
    use proptest::prelude::*;

    fn product(id: i32, cents: i64, stock: Option<u32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Plant {id}"),
            slug: format!("plant-{id}"),
            description: String::new(),
            price: Price::usd_cents(cents),
            compare_at_price: None,
            image_url: None,
            sku: format!("SKU-{id}"),
            stock,
            category_id: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_add_appends_new_line() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        let line = cart.add(&product(42, 1000, None), 2, id).unwrap();
        assert_eq!(line.id, id);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.product.name, "Plant 42");
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_existing_product_increments() {
        let mut cart = Cart::new();
        let first = LineItemId::generate();
        cart.add(&product(1, 500, None), 1, first).unwrap();
        let line = cart
            .add(&product(1, 500, None), 3, LineItemId::generate())
            .unwrap();
        assert_eq!(line.id, first);
        assert_eq!(line.quantity, 4);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_clamps_to_stock() {
        let mut cart = Cart::new();
        let p = product(1, 500, Some(3));
        cart.add(&p, 2, LineItemId::generate()).unwrap();
        let line = cart.add(&p, 5, LineItemId::generate()).unwrap();
        assert_eq!(line.quantity, 3);
    }

    #[test]
    fn test_add_never_lowers_quantity_above_stock() {
        let mut cart = Cart::new();
        let p = product(1, 500, Some(3));
        let id = LineItemId::generate();
        cart.add(&p, 1, id).unwrap();
        cart.set_quantity(id, 5).unwrap();

        let line = cart.add(&p, 1, LineItemId::generate()).unwrap();
        assert_eq!(line.id, id);
        assert_eq!(line.quantity, 5);
    }

    #[test]
    fn test_add_rejects_zero_and_out_of_stock() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add(&product(1, 500, None), 0, LineItemId::generate()),
            Err(CartError::Validation(_))
        ));
        assert_eq!(
            cart.add(&product(2, 500, Some(0)), 1, LineItemId::generate())
                .unwrap_err(),
            CartError::ProductUnavailable(ProductId::new(2))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_keeps_original_snapshot_price() {
        let mut cart = Cart::new();
        cart.add(&product(1, 1000, None), 1, LineItemId::generate())
            .unwrap();
        let repriced = product(1, 1500, None);
        let line = cart.add(&repriced, 1, LineItemId::generate()).unwrap();
        assert_eq!(line.product.price, Price::usd_cents(1000));
    }

    #[test]
    fn test_set_quantity_zero_leaves_line_unchanged() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        cart.add(&product(1, 500, None), 2, id).unwrap();
        assert!(matches!(
            cart.set_quantity(id, 0),
            Err(CartError::Validation(_))
        ));
        assert_eq!(cart.get(id).unwrap().quantity, 2);
    }

    #[test]
    fn test_set_quantity_does_not_clamp() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        cart.add(&product(1, 500, Some(2)), 1, id).unwrap();
        assert_eq!(cart.set_quantity(id, 9).unwrap().quantity, 9);
    }

    #[test]
    fn test_set_quantity_missing_line() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        assert_eq!(cart.set_quantity(id, 1).unwrap_err(), CartError::NotFound(id));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        cart.add(&product(1, 500, None), 1, id).unwrap();
        assert!(cart.remove(id).is_some());
        let after_once = cart.clone();
        assert!(cart.remove(id).is_none());
        assert_eq!(cart, after_once);
    }

    #[test]
    fn test_restore_reinserts_at_position() {
        let mut cart = Cart::new();
        let ids: Vec<_> = (1..=3).map(|_| LineItemId::generate()).collect();
        for (i, id) in ids.iter().enumerate() {
            cart.add(&product(i32::try_from(i).unwrap(), 100, None), 1, *id)
                .unwrap();
        }
        let index = cart.position(ids[1]).unwrap();
        let removed = cart.remove(ids[1]).unwrap();
        cart.restore(index, removed);
        let order: Vec<_> = cart.items().iter().map(|item| item.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_replace_with_zero_quantity_removes() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        cart.add(&product(1, 500, None), 1, id).unwrap();
        let mut line = cart.get(id).unwrap().clone();
        line.quantity = 0;
        assert!(cart.replace(line));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_deserialize_rejects_zero_quantity() {
        let mut cart = Cart::new();
        let id = LineItemId::generate();
        cart.add(&product(1, 500, None), 1, id).unwrap();
        let mut json = serde_json::to_value(&cart).unwrap();
        json["items"][0]["quantity"] = serde_json::json!(0);
        assert!(serde_json::from_value::<Cart>(json).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { product: i32, quantity: u32 },
        Update { slot: usize, quantity: u32 },
        Remove { slot: usize },
        Clear,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..5_i32, 0..6_u32).prop_map(|(product, quantity)| Op::Add { product, quantity }),
            3 => (0..8_usize, 0..6_u32).prop_map(|(slot, quantity)| Op::Update { slot, quantity }),
            2 => (0..8_usize).prop_map(|slot| Op::Remove { slot }),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_quantities_stay_positive_and_products_unique(ops in prop::collection::vec(arb_op(), 0..40)) {
            let mut cart = Cart::new();
            let mut seen_ids: Vec<LineItemId> = Vec::new();

            for op in ops {
                match op {
                    Op::Add { product: p, quantity } => {
                        let stock = if p == 4 { Some(3) } else { None };
                        let id = LineItemId::generate();
                        seen_ids.push(id);
                        let _ = cart.add(&product(p, 250, stock), quantity, id);
                    }
                    Op::Update { slot, quantity } => {
                        if let Some(id) = seen_ids.get(slot) {
                            let _ = cart.set_quantity(*id, quantity);
                        }
                    }
                    Op::Remove { slot } => {
                        if let Some(id) = seen_ids.get(slot) {
                            cart.remove(*id);
                        }
                    }
                    Op::Clear => cart.clear(),
                }

                prop_assert!(cart.items().iter().all(|item| item.quantity >= 1));
                let mut products: Vec<_> = cart.items().iter().map(|item| item.product_id).collect();
                products.sort();
                products.dedup();
                prop_assert_eq!(products.len(), cart.len());
            }
        }
    }
}
