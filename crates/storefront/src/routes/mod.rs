//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness (catalog loaded)
//!
//! # Catalog
//! GET    /api/products            - Product listing (?category=&q=&sort=&page=&per_page=)
//! GET    /api/products/{slug}     - Product detail
//! GET    /api/categories          - Category listing
//! GET    /api/categories/{slug}   - Category with its products
//!
//! # Content
//! GET    /api/blog                - Published posts (?tag=)
//! GET    /api/blog/tags           - All tags
//! GET    /api/blog/{slug}         - Post detail
//! GET    /api/pages/{slug}        - Static page
//!
//! # Cart (bound to the session cookie)
//! GET    /cart                    - Cart with price summary
//! POST   /cart/items              - Add item (201 with the line)
//! PATCH  /cart/items/{id}         - Set quantity
//! DELETE /cart/items/{id}         - Remove line (404 when absent)
//! DELETE /cart                    - Empty the cart
//!
//! # Checkout
//! POST   /checkout                - Place order (201 with the confirmation)
//! ```

pub mod blog;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod pages;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/tags", get(blog::tags))
        .route("/{slug}", get(blog::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/blog", blog_routes())
        .route("/api/pages/{slug}", get(pages::show))
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::place_order))
}
