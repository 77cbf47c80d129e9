//! Checkout handler.
//!
//! Turns the session's cart into an [`OrderConfirmation`]. Payment and
//! fulfilment are handled elsewhere; placing the order here freezes the
//! items and totals, then drops the cart.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;
use verdant_core::{CartError, OrderConfirmation, OrderId, summarize};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::forget_cart;
use crate::routes::cart::existing_cart;
use crate::state::AppState;

/// Place an order for the current cart.
///
/// Every product must still be in the catalog and in stock. On success the
/// cart is removed and the session forgets it.
#[instrument(skip(state, session))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let (cart_id, cart) = existing_cart(&state, &session)
        .await?
        .ok_or_else(|| CartError::Validation("cart is empty".to_string()))?;

    let mut cart = cart.lock().await;
    if cart.is_empty() {
        return Err(CartError::Validation("cart is empty".to_string()).into());
    }

    let catalog = state.catalog();
    for item in cart.items() {
        let available = catalog
            .product(item.product_id)
            .is_some_and(|p| p.stock.is_none_or(|stock| stock >= item.quantity));
        if !available {
            return Err(AppError::Cart(CartError::ProductUnavailable(item.product_id)));
        }
    }

    let items = cart.items().to_vec();
    let summary = summarize(&items, &state.config().pricing);
    let order = OrderConfirmation {
        order_id: OrderId::generate(),
        cart_id,
        placed_at: Utc::now(),
        items,
        summary,
    };

    // The session must let go of the cart before it is destroyed; if that
    // fails, the cart is still intact and the shopper can retry.
    forget_cart(&session).await?;

    // Clear while still holding the lock so a racing add cannot slip into an
    // order that was already placed.
    cart.clear();
    drop(cart);
    state.carts().remove(cart_id).await;

    add_breadcrumb("checkout", "Order placed", &[("order_id", order.order_id.to_string())]);
    tracing::info!(
        order_id = %order.order_id,
        cart_id = %cart_id,
        items = order.summary.item_count,
        total = %order.summary.total,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(order)))
}
