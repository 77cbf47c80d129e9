//! Static page handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::content::Page;
use crate::error::{AppError, Result};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Page>> {
    state
        .content()
        .get_page(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))
}
