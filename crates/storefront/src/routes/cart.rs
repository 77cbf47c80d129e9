//! Cart handlers.
//!
//! The cart is bound to the shopper through the session cookie: the session
//! stores a [`CartId`] and the cart itself lives in the
//! [`CartRepository`](crate::carts::CartRepository). A session gets a cart on
//! its first add; reads before that see an empty cart with no ID.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;
use tracing::instrument;
use verdant_core::{
    AddItemRequest, CartError, CartId, CartView, LineItem, LineItemId, UpdateQuantityRequest,
    summarize, validate_quantity,
};

use crate::carts::SharedCart;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{session_cart_id, set_session_cart_id};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// The session's cart, if it has one that is still alive.
pub(crate) async fn existing_cart(
    state: &AppState,
    session: &Session,
) -> Result<Option<(CartId, SharedCart)>> {
    let Some(cart_id) = session_cart_id(session).await? else {
        return Ok(None);
    };
    Ok(state.carts().get(cart_id).await.map(|cart| (cart_id, cart)))
}

/// The session's cart, created and bound to the session if needed.
async fn cart_for_update(state: &AppState, session: &Session) -> Result<SharedCart> {
    if let Some(cart_id) = session_cart_id(session).await? {
        // The cart may have been evicted while the session lived on; recreate
        // it under the same ID.
        return Ok(state.carts().get_or_create(cart_id).await);
    }

    let cart_id = CartId::generate();
    set_session_cart_id(session, cart_id).await?;
    tracing::info!(cart_id = %cart_id, "Created cart");
    Ok(state.carts().get_or_create(cart_id).await)
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart with its price summary.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let policy = &state.config().pricing;

    let view = match existing_cart(&state, &session).await? {
        Some((cart_id, cart)) => {
            let cart = cart.lock().await;
            CartView {
                cart_id: Some(cart_id),
                items: cart.items().to_vec(),
                summary: summarize(cart.items(), policy),
            }
        }
        None => CartView {
            cart_id: None,
            items: Vec::new(),
            summary: summarize(&[], policy),
        },
    };

    Ok(Json(view))
}

/// Add a product, merging into its existing line if present.
#[instrument(skip(state, session, request), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<LineItem>)> {
    validate_quantity(request.quantity)?;
    let product = state
        .catalog()
        .product(request.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let cart = cart_for_update(&state, &session).await?;
    let mut cart = cart.lock().await;

    let line_id = request.line_item_id.unwrap_or_else(LineItemId::generate);
    if cart
        .get(line_id)
        .is_some_and(|line| line.product_id != product.id)
    {
        return Err(CartError::Validation(format!(
            "line item id {line_id} is already used by another product"
        ))
        .into());
    }

    let line = cart.add(product, request.quantity, line_id)?.clone();
    drop(cart);

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", product.id.to_string()),
            ("quantity", line.quantity.to_string()),
        ],
    );
    tracing::info!(line_item_id = %line.id, quantity = line.quantity, "Added to cart");

    Ok((StatusCode::CREATED, Json(line)))
}

/// Set a line's quantity. Zero is rejected; use `DELETE` to remove.
#[instrument(skip(state, session, request))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<LineItemId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<LineItem>> {
    validate_quantity(request.quantity)?;
    let (_, cart) = existing_cart(&state, &session)
        .await?
        .ok_or(CartError::NotFound(id))?;

    let line = cart.lock().await.set_quantity(id, request.quantity)?.clone();

    tracing::info!(line_item_id = %id, quantity = line.quantity, "Updated cart line");
    Ok(Json(line))
}

/// Remove a line. 404 when the line is not in the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<LineItemId>,
) -> Result<StatusCode> {
    let (_, cart) = existing_cart(&state, &session)
        .await?
        .ok_or(CartError::NotFound(id))?;

    let removed = cart.lock().await.remove(id).ok_or(CartError::NotFound(id))?;

    add_breadcrumb(
        "cart",
        "Removed from cart",
        &[("product_id", removed.product_id.to_string())],
    );
    tracing::info!(line_item_id = %id, "Removed cart line");
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the cart. Always succeeds.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    if let Some((cart_id, cart)) = existing_cart(&state, &session).await? {
        cart.lock().await.clear();
        tracing::info!(cart_id = %cart_id, "Cleared cart");
    }
    Ok(StatusCode::NO_CONTENT)
}
