//! Read-only product catalog.
//!
//! The catalog is a JSON document (`<content_dir>/catalog.json`) with
//! `categories` and `products` arrays. It is validated once at load and then
//! shared immutably; carts only ever read from it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdant_core::{Category, CategoryId, Product, ProductId};

/// Products per page when the request does not say.
pub const DEFAULT_PER_PAGE: usize = 12;

/// Upper bound on `per_page`.
pub const MAX_PER_PAGE: usize = 48;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id {0}")]
    DuplicateProductId(ProductId),
    #[error("duplicate product slug '{0}'")]
    DuplicateProductSlug(String),
    #[error("duplicate category '{0}'")]
    DuplicateCategory(String),
    #[error("product {0} has a negative price")]
    NegativePrice(ProductId),
    #[error("product {product} references unknown category {category}")]
    UnknownCategory {
        product: ProductId,
        category: CategoryId,
    },
}

/// On-disk shape of `catalog.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Catalog order.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Filters and paging for [`Catalog::search`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// Case-insensitive text matched against name, description, SKU and tags.
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

/// One page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Validated, indexed catalog.
#[derive(Debug, Default)]
pub struct Catalog {
    categories: Vec<Category>,
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
    by_slug: HashMap<String, usize>,
}

impl Catalog {
    /// Load and validate `catalog.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            products = catalog.products.len(),
            categories = catalog.categories.len(),
            "Loaded catalog from {:?}",
            path
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    /// Validate a catalog document and build its indexes.
    ///
    /// # Errors
    ///
    /// - duplicate product ids or slugs, duplicate category ids or slugs
    /// - a negative price or compare-at price
    /// - a product pointing at a category that does not exist
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let CatalogDocument {
            categories,
            products,
        } = document;

        let mut category_ids = HashSet::new();
        let mut category_slugs = HashSet::new();
        for category in &categories {
            if !category_ids.insert(category.id) {
                return Err(CatalogError::DuplicateCategory(category.id.to_string()));
            }
            if !category_slugs.insert(category.slug.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.slug.clone()));
            }
        }

        let mut by_id = HashMap::with_capacity(products.len());
        let mut by_slug = HashMap::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            if by_id.insert(product.id, index).is_some() {
                return Err(CatalogError::DuplicateProductId(product.id));
            }
            if by_slug.insert(product.slug.clone(), index).is_some() {
                return Err(CatalogError::DuplicateProductSlug(product.slug.clone()));
            }
            let negative = product.price.amount < Decimal::ZERO
                || product
                    .compare_at_price
                    .is_some_and(|p| p.amount < Decimal::ZERO);
            if negative {
                return Err(CatalogError::NegativePrice(product.id));
            }
            if let Some(category) = product
                .category_id
                .filter(|id| !category_ids.contains(id))
            {
                return Err(CatalogError::UnknownCategory {
                    product: product.id,
                    category,
                });
            }
        }

        Ok(Self {
            categories,
            products,
            by_id,
            by_slug,
        })
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.by_id.get(&id).and_then(|&i| self.products.get(i))
    }

    #[must_use]
    pub fn product_by_slug(&self, slug: &str) -> Option<&Product> {
        self.by_slug.get(slug).and_then(|&i| self.products.get(i))
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn category_by_slug(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// Products in a category, in catalog order.
    pub fn products_in(&self, category: CategoryId) -> impl Iterator<Item = &Product> {
        self.products
            .iter()
            .filter(move |p| p.category_id == Some(category))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Filter, sort and paginate products.
    ///
    /// An unknown category slug matches nothing. Pages are 1-based; a page
    /// past the end is empty.
    #[must_use]
    pub fn search(&self, query: &ProductQuery) -> ProductPage {
        let category = query
            .category
            .as_deref()
            .map(|slug| self.category_by_slug(slug).map(|c| c.id));
        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| match category {
                None => true,
                Some(None) => false,
                Some(Some(id)) => p.category_id == Some(id),
            })
            .filter(|p| needle.as_deref().is_none_or(|n| matches_text(p, n)))
            .collect();

        match query.sort {
            ProductSort::Featured => {}
            ProductSort::PriceAsc => matches.sort_by(|a, b| a.price.amount.cmp(&b.price.amount)),
            ProductSort::PriceDesc => matches.sort_by(|a, b| b.price.amount.cmp(&a.price.amount)),
            ProductSort::Name => {
                matches.sort_by_key(|p| p.name.to_lowercase());
            }
        }

        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = query.page.unwrap_or(1).max(1);
        let total = matches.len();

        let products = matches
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        ProductPage {
            products,
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

fn matches_text(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product.sku.to_lowercase().contains(needle)
        || product.tags.iter().any(|t| t.to_lowercase().contains(needle))
}
