//! Product catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use verdant_core::Product;

use crate::catalog::{ProductPage, ProductQuery};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// List products with optional category, text, sort and paging.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<ProductPage> {
    Json(state.catalog().search(&query))
}

/// Product detail by slug.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>> {
    state
        .catalog()
        .product_by_slug(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))
}
