//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::carts::CartRepository;
use crate::catalog::{Catalog, CatalogError};
use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};

/// Error building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The catalog and content are immutable after
/// startup; carts are the only mutable state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    content: ContentStore,
    carts: CartRepository,
}

impl AppState {
    /// Load the catalog and content from `config.content_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `catalog.json` is missing or invalid, or if a
    /// content directory cannot be read.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let catalog = Catalog::load(&config.content_dir.join("catalog.json"))?;
        let content = ContentStore::load(&config.content_dir)?;
        Ok(Self::from_parts(config, catalog, content))
    }

    /// Assemble state from already loaded parts.
    #[must_use]
    pub fn from_parts(config: StorefrontConfig, catalog: Catalog, content: ContentStore) -> Self {
        let carts = CartRepository::new(config.cart_idle_timeout);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                content,
                carts,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    #[must_use]
    pub fn carts(&self) -> &CartRepository {
        &self.inner.carts
    }
}
