//! `CartSync` over the storefront's REST cart endpoints.
//!
//! The server binds carts to a session cookie, so the underlying `reqwest`
//! client keeps a cookie store. One `HttpCartSync` therefore represents one
//! shopper session; clones share the same cookies.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use tracing::instrument;
use url::Url;
use verdant_core::{AddItemRequest, CartView, LineItem, LineItemId, UpdateQuantityRequest};

use crate::error::SyncError;
use crate::sync::CartSync;

/// Default per-request timeout applied by [`HttpCartSync::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest error body kept in a `SyncError` message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP implementation of [`CartSync`].
#[derive(Clone)]
pub struct HttpCartSync {
    inner: Arc<HttpCartSyncInner>,
}

struct HttpCartSyncInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCartSync {
    /// Create a client for the storefront at `base_url` with its own cookie
    /// store and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured `reqwest` client. It must keep cookies for the
    /// server to recognize the session.
    #[must_use]
    pub fn with_client(client: reqwest::Client, mut base_url: Url) -> Self {
        // Url::join replaces the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            inner: Arc::new(HttpCartSyncInner { client, base_url }),
        }
    }

    /// The storefront base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, SyncError> {
        let url = self.inner.base_url.join(path)?;
        Ok(self.inner.client.request(method, url))
    }
}

/// Map a non-success status and its body to a `SyncError`.
pub(crate) fn classify(status: StatusCode, body: &str) -> SyncError {
    let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    match status {
        StatusCode::NOT_FOUND => SyncError::NotFound(message),
        StatusCode::CONFLICT => SyncError::Conflict(message),
        s if s.is_client_error() => SyncError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => SyncError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

/// Pass through successful responses, classify the rest.
async fn check(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = classify(status, &body);
    if err.is_network() {
        tracing::error!(status = %status, body = %body.chars().take(500).collect::<String>(), "Cart API returned server error");
    } else {
        tracing::debug!(status = %status, "Cart API rejected request");
    }
    Err(err)
}

impl CartSync for HttpCartSync {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<CartView, SyncError> {
        let response = self.request(Method::GET, "cart")?.send().await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    async fn add_item(&self, request: &AddItemRequest) -> Result<LineItem, SyncError> {
        let response = self
            .request(Method::POST, "cart/items")?
            .json(request)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self), fields(line_item_id = %id))]
    async fn update_quantity(&self, id: LineItemId, quantity: u32) -> Result<LineItem, SyncError> {
        let response = self
            .request(Method::PATCH, &format!("cart/items/{id}"))?
            .json(&UpdateQuantityRequest { quantity })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self), fields(line_item_id = %id))]
    async fn remove_item(&self, id: LineItemId) -> Result<(), SyncError> {
        let response = self
            .request(Method::DELETE, &format!("cart/items/{id}"))?
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), SyncError> {
        let response = self.request(Method::DELETE, "cart")?.send().await?;
        check(response).await?;
        Ok(())
    }
}
