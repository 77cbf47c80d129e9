//! Server-side cart storage.
//!
//! Carts live in memory in a `moka` cache keyed by [`CartId`]. Entries are
//! evicted after a period without access, so abandoned carts disappear on
//! their own. Each cart sits behind its own async mutex: requests against one
//! cart are serialized, requests against different carts are not.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use verdant_core::{Cart, CartId};

/// Upper bound on live carts held in memory.
const MAX_CARTS: u64 = 100_000;

/// A cart shared between concurrent requests of the same session.
pub type SharedCart = Arc<Mutex<Cart>>;

/// In-memory cart store with idle eviction.
#[derive(Clone)]
pub struct CartRepository {
    carts: Cache<CartId, SharedCart>,
}

impl CartRepository {
    /// Create a repository that evicts carts untouched for `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        let carts = Cache::builder()
            .max_capacity(MAX_CARTS)
            .time_to_idle(idle_timeout)
            .build();

        Self { carts }
    }

    /// Look up an existing cart.
    pub async fn get(&self, id: CartId) -> Option<SharedCart> {
        self.carts.get(&id).await
    }

    /// Look up a cart, creating an empty one under `id` if needed.
    ///
    /// Concurrent calls for the same `id` receive the same cart.
    pub async fn get_or_create(&self, id: CartId) -> SharedCart {
        self.carts
            .get_with(id, async move { Arc::new(Mutex::new(Cart::with_id(id))) })
            .await
    }

    /// Drop a cart (after checkout or when the session ends).
    pub async fn remove(&self, id: CartId) {
        self.carts.invalidate(&id).await;
    }

    /// Approximate number of live carts.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.carts.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_returns_same_cart() {
        let repo = CartRepository::new(Duration::from_secs(60));
        let id = CartId::generate();

        assert!(repo.get(id).await.is_none());
        let first = repo.get_or_create(id).await;
        let second = repo.get_or_create(id).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lock().await.id(), id);
        assert!(repo.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = CartRepository::new(Duration::from_secs(60));
        let id = CartId::generate();
        repo.get_or_create(id).await;

        repo.remove(id).await;
        assert!(repo.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_carts_are_independent() {
        let repo = CartRepository::new(Duration::from_secs(60));
        let a = repo.get_or_create(CartId::generate()).await;
        let b = repo.get_or_create(CartId::generate()).await;
        assert!(!Arc::ptr_eq(&a, &b));

        // Holding one cart's lock does not block the other
        let _guard = a.lock().await;
        assert!(b.try_lock().is_ok());
    }
}
