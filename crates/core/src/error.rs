//! Cart error taxonomy shared by the server and the client store.

use thiserror::Error;

use crate::types::{LineItemId, ProductId};

/// Errors produced by cart mutations.
///
/// None of these are fatal: each describes a single rejected operation and
/// leaves the rest of the cart untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Bad input, such as a quantity below 1.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another mutation for the same line item has not settled yet.
    #[error("Line item {0} has a pending change, please wait")]
    ConcurrentModification(LineItemId),

    /// A whole-cart operation is pending, or one is requested while line
    /// mutations are pending.
    #[error("Cart has a pending change, please wait")]
    CartBusy,

    /// The line item is not in the cart (possibly removed elsewhere).
    #[error("Line item {0} is no longer in the cart")]
    NotFound(LineItemId),

    /// The product does not exist or is out of stock.
    #[error("Product {0} is not available")]
    ProductUnavailable(ProductId),

    /// The remote cart could not be reached or failed internally.
    #[error("Network error: {0}")]
    Network(String),
}

impl CartError {
    /// Whether retrying the same operation later can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::ConcurrentModification(_) | Self::CartBusy
        )
    }
}
