//! Session-stored cart binding.
//!
//! The session holds nothing but the ID of the shopper's cart; the cart
//! itself lives in the [`CartRepository`](crate::carts::CartRepository).

use tower_sessions::Session;
use verdant_core::CartId;

/// Session keys.
pub mod keys {
    /// Key for storing the cart ID.
    pub const CART_ID: &str = "cart_id";
}

/// The cart bound to this session, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn session_cart_id(
    session: &Session,
) -> Result<Option<CartId>, tower_sessions::session::Error> {
    session.get::<CartId>(keys::CART_ID).await
}

/// Bind a cart to this session.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn set_session_cart_id(
    session: &Session,
    cart_id: CartId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id).await
}

/// Unbind the cart from this session (after checkout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn forget_cart(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CartId>(keys::CART_ID).await?;
    Ok(())
}
