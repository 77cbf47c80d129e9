//! The seam between the cart store and the remote cart.

use std::future::Future;

use verdant_core::{AddItemRequest, CartView, LineItem, LineItemId};

use crate::error::SyncError;

/// Remote cart operations, one call per local mutation.
///
/// Implementations do not retry; the store reports failures to its caller
/// and the UI decides whether to try again.
pub trait CartSync: Send + Sync {
    /// Fetch the server's copy of the cart.
    fn fetch_cart(&self) -> impl Future<Output = Result<CartView, SyncError>> + Send;

    /// Add units of a product. Returns the server's line after the add.
    fn add_item(
        &self,
        request: &AddItemRequest,
    ) -> impl Future<Output = Result<LineItem, SyncError>> + Send;

    /// Set a line's quantity. Returns the server's line after the update.
    fn update_quantity(
        &self,
        id: LineItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<LineItem, SyncError>> + Send;

    /// Remove a line.
    fn remove_item(&self, id: LineItemId) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Remove every line.
    fn clear(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
}
