//! Integration tests for Verdant.
//!
//! Each test starts the real storefront router on an ephemeral local port,
//! loaded with the seed catalog and content from `crates/storefront/content`,
//! and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p verdant-integration-tests
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;
use verdant_core::{Product, ProductId};
use verdant_storefront::config::StorefrontConfig;
use verdant_storefront::state::AppState;

/// Seed content shipped with the storefront crate.
#[must_use]
pub fn content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/content")
}

/// A storefront running in the background of the current test runtime.
pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: Url,
    pub state: AppState,
}

impl TestServer {
    /// Bind to `127.0.0.1:0` and serve the storefront until the runtime
    /// shuts down.
    ///
    /// # Panics
    ///
    /// Panics if the seed content fails to load or the port cannot be bound.
    pub async fn start() -> Self {
        let content_dir = content_dir();
        let config = StorefrontConfig::from_lookup(|key| match key {
            "VERDANT_BASE_URL" => Some("http://127.0.0.1".to_string()),
            "VERDANT_CONTENT_DIR" => Some(content_dir.display().to_string()),
            _ => None,
        })
        .expect("test configuration");
        let state = AppState::new(config).expect("seed catalog and content");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local address");
        let app = verdant_storefront::app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("storefront server");
        });

        let base_url = Url::parse(&format!("http://{addr}/")).expect("base url");
        Self {
            addr,
            base_url,
            state,
        }
    }

    /// A product from the seed catalog.
    ///
    /// # Panics
    ///
    /// Panics if the catalog has no product with this ID.
    #[must_use]
    pub fn product(&self, id: i32) -> Product {
        self.state
            .catalog()
            .product(ProductId::new(id))
            .cloned()
            .expect("product in seed catalog")
    }

    /// A fresh HTTP client with its own cookie jar (a new shopper).
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn shopper(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for `path`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid relative URL.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("valid path")
    }
}
