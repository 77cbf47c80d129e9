//! Category handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;
use verdant_core::{Category, Product};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// A category together with its products.
#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// List all categories.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.catalog().categories().to_vec())
}

/// Category detail with products in catalog order.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>> {
    let catalog = state.catalog();
    let category = catalog
        .category_by_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    Ok(Json(CategoryDetail {
        category: category.clone(),
        products: catalog.products_in(category.id).cloned().collect(),
    }))
}
