//! Validate the catalog and markdown content before deploying them.

use std::path::Path;

use tracing::{error, info, warn};
use verdant_storefront::catalog::Catalog;
use verdant_storefront::content::ContentStore;

/// Load and validate a `catalog.json` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub fn catalog(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Checking catalog");
    let catalog = Catalog::load(path)?;

    let unavailable = catalog
        .products()
        .iter()
        .filter(|p| !p.is_available())
        .count();
    let uncategorized = catalog
        .products()
        .iter()
        .filter(|p| p.category_id.is_none())
        .count();

    if catalog.is_empty() {
        warn!("Catalog has no products");
    }
    if uncategorized > 0 {
        warn!(uncategorized, "Some products have no category");
    }

    info!(
        products = catalog.products().len(),
        categories = catalog.categories().len(),
        out_of_stock = unavailable,
        "Catalog is valid"
    );
    Ok(())
}

/// Parse every page and post under `dir`. Any file that fails is an error.
///
/// # Errors
///
/// Returns an error if a directory cannot be read or any file fails to parse.
pub fn content(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!(dir = %dir.display(), "Checking content");
    let store = ContentStore::load(dir)?;

    for skipped in store.skipped() {
        error!(path = %skipped.path.display(), "{}", skipped.reason);
    }
    if !store.skipped().is_empty() {
        return Err(format!("{} content files failed to parse", store.skipped().len()).into());
    }

    let published = store.get_published_posts().count();
    info!(
        pages = store.page_count(),
        posts = store.post_count(),
        published,
        drafts = store.post_count() - published,
        tags = store.get_all_tags().len(),
        "Content is valid"
    );
    Ok(())
}
