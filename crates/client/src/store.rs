//! Optimistic cart store.
//!
//! The local cart is held as an `Arc<Cart>` behind a short synchronous lock.
//! Every mutation:
//!
//! 1. claims an in-flight slot for the line it touches (or the whole cart),
//! 2. applies the change locally and keeps the prior value of that line,
//! 3. releases the lock and awaits the remote call,
//! 4. on failure, puts the prior value back for that line only.
//!
//! The lock is never held across an `.await`, and writers replace the `Arc`
//! rather than mutating a list readers may be looking at, so a reader always
//! sees a settled cart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::instrument;
use verdant_core::{
    AddItemRequest, Cart, CartError, LineItem, LineItemId, PriceSummary, PricingPolicy, Product,
    summarize, validate_quantity,
};

use crate::error::SyncError;
use crate::sync::CartSync;

/// What an in-flight mutation has claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InFlightKey {
    /// A single line item.
    Line(LineItemId),
    /// The whole cart (`clear`, `refresh`).
    Cart,
}

type InFlightMap = HashMap<InFlightKey, u64>;

/// Releases its in-flight slot on drop, including when the owning future is
/// dropped before completing.
struct InFlightGuard<'a> {
    map: &'a Mutex<InFlightMap>,
    key: InFlightKey,
    token: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if map.get(&self.key) == Some(&self.token) {
            map.remove(&self.key);
        }
    }
}

/// Shopper-session cart with optimistic updates over a [`CartSync`].
///
/// Construct one per session and pass it (or an `Arc` of it) to whatever
/// needs the cart; there is no global instance.
pub struct CartStore<S> {
    sync: S,
    policy: PricingPolicy,
    state: Mutex<Arc<Cart>>,
    in_flight: Mutex<InFlightMap>,
    next_token: AtomicU64,
}

impl<S: CartSync> CartStore<S> {
    /// Create a store with an empty local cart.
    pub fn new(sync: S, policy: PricingPolicy) -> Self {
        Self {
            sync,
            policy,
            state: Mutex::new(Arc::new(Cart::new())),
            in_flight: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// The sync layer this store pushes changes through.
    pub const fn sync(&self) -> &S {
        &self.sync
    }

    /// Current settled cart.
    pub fn snapshot(&self) -> Arc<Cart> {
        Arc::clone(&self.lock_state())
    }

    /// Current line items.
    pub fn items(&self) -> Vec<LineItem> {
        self.snapshot().items().to_vec()
    }

    /// Price summary of the current cart, recomputed on every call.
    pub fn summary(&self) -> PriceSummary {
        summarize(self.snapshot().items(), &self.policy)
    }

    /// Whether a mutation for this line is awaiting the server.
    pub fn is_in_flight(&self, id: LineItemId) -> bool {
        self.lock_in_flight()
            .contains_key(&InFlightKey::Line(id))
    }

    /// Number of mutations awaiting the server.
    pub fn pending(&self) -> usize {
        self.lock_in_flight().len()
    }

    /// Add `quantity` units of `product`, merging into its existing line.
    ///
    /// # Errors
    ///
    /// - `Validation` if `quantity` is 0 or the server rejects the input
    /// - `ProductUnavailable` if the product is out of stock or unknown to
    ///   the server
    /// - `ConcurrentModification` / `CartBusy` if the line or cart is busy
    /// - `Network` if the server could not be reached
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<LineItem, CartError> {
        validate_quantity(quantity)?;
        if !product.is_available() {
            return Err(CartError::ProductUnavailable(product.id));
        }

        let (guard, line_id, prior) = {
            let mut state = self.lock_state();
            let prior = state.find_product(product.id).cloned();
            let line_id = prior.as_ref().map_or_else(LineItemId::generate, |line| line.id);
            let guard = self.claim(InFlightKey::Line(line_id))?;
            Arc::make_mut(&mut state).add(product, quantity, line_id)?;
            (guard, line_id, prior)
        };

        let request = AddItemRequest {
            product_id: product.id,
            quantity,
            line_item_id: Some(line_id),
        };

        let result = match self.sync.add_item(&request).await {
            Ok(ack) => {
                self.apply(|cart| {
                    if ack.id != line_id {
                        // the server already had a line for this product
                        cart.remove(line_id);
                    }
                    if !cart.replace(ack.clone()) {
                        cart.restore(cart.len(), ack.clone());
                    }
                });
                tracing::debug!(line_item_id = %ack.id, quantity = ack.quantity, "Add acknowledged");
                Ok(ack)
            }
            Err(err) => {
                self.apply(|cart| match prior {
                    Some(line) => {
                        cart.replace(line);
                    }
                    None => {
                        cart.remove(line_id);
                    }
                });
                tracing::warn!(error = %err, "Add failed, rolled back");
                Err(match err {
                    SyncError::NotFound(_) | SyncError::Conflict(_) => {
                        CartError::ProductUnavailable(product.id)
                    }
                    other => into_cart_error(other),
                })
            }
        };

        drop(guard);
        result
    }

    /// Set a line's quantity.
    ///
    /// A quantity of 0 is rejected and leaves the line unchanged; use
    /// [`remove`](Self::remove) instead. If the server no longer has the
    /// line, it is removed locally too and `NotFound` is returned so the UI
    /// can tell the shopper.
    ///
    /// # Errors
    ///
    /// - `Validation` if `quantity` is 0 or the server rejects the input
    /// - `NotFound` if the line is gone locally or server-side
    /// - `ConcurrentModification` / `CartBusy` if the line or cart is busy
    /// - `Network` if the server could not be reached
    #[instrument(skip(self), fields(line_item_id = %id))]
    pub async fn update_quantity(&self, id: LineItemId, quantity: u32) -> Result<LineItem, CartError> {
        validate_quantity(quantity)?;

        let (guard, prior) = {
            let mut state = self.lock_state();
            let prior = state.get(id).cloned().ok_or(CartError::NotFound(id))?;
            let guard = self.claim(InFlightKey::Line(id))?;
            Arc::make_mut(&mut state).set_quantity(id, quantity)?;
            (guard, prior)
        };

        let result = match self.sync.update_quantity(id, quantity).await {
            Ok(ack) => {
                self.apply(|cart| {
                    cart.replace(ack.clone());
                });
                Ok(ack)
            }
            Err(SyncError::NotFound(_)) => {
                self.apply(|cart| {
                    cart.remove(id);
                });
                tracing::info!("Line item no longer exists server-side, removed locally");
                Err(CartError::NotFound(id))
            }
            Err(err) => {
                self.apply(|cart| {
                    cart.replace(prior);
                });
                tracing::warn!(error = %err, "Quantity update failed, rolled back");
                Err(into_cart_error(err))
            }
        };

        drop(guard);
        result
    }

    /// Remove a line. Removing an absent line is a no-op.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` / `CartBusy` if the line or cart is busy
    /// - `Network` / `Validation` if the server call fails (the line is
    ///   restored at its old position)
    #[instrument(skip(self), fields(line_item_id = %id))]
    pub async fn remove(&self, id: LineItemId) -> Result<(), CartError> {
        let (guard, index, removed) = {
            let mut state = self.lock_state();
            let Some(index) = state.position(id) else {
                return Ok(());
            };
            let guard = self.claim(InFlightKey::Line(id))?;
            let Some(removed) = Arc::make_mut(&mut state).remove(id) else {
                return Ok(());
            };
            (guard, index, removed)
        };

        let result = match self.sync.remove_item(id).await {
            Ok(()) | Err(SyncError::NotFound(_)) => Ok(()),
            Err(err) => {
                self.apply(|cart| cart.restore(index, removed));
                tracing::warn!(error = %err, "Remove failed, rolled back");
                Err(into_cart_error(err))
            }
        };

        drop(guard);
        result
    }

    /// Empty the cart in one step.
    ///
    /// # Errors
    ///
    /// - `CartBusy` if any other mutation is pending
    /// - `Network` / `Validation` if the server call fails (the previous
    ///   cart is restored whole)
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), CartError> {
        let (guard, prior) = {
            let mut state = self.lock_state();
            let guard = self.claim(InFlightKey::Cart)?;
            let prior = Arc::clone(&state);
            *state = Arc::new(Cart::with_id(prior.id()));
            (guard, prior)
        };

        let result = match self.sync.clear().await {
            Ok(()) => Ok(()),
            Err(err) => {
                *self.lock_state() = prior;
                tracing::warn!(error = %err, "Clear failed, rolled back");
                Err(into_cart_error(err))
            }
        };

        drop(guard);
        result
    }

    /// Replace the local cart with the server's copy.
    ///
    /// # Errors
    ///
    /// - `CartBusy` if any mutation is pending
    /// - `Validation` if the server's cart breaks the cart invariants
    /// - `Network` if the server could not be reached
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<PriceSummary, CartError> {
        let guard = {
            let _state = self.lock_state();
            self.claim(InFlightKey::Cart)?
        };

        let result = match self.sync.fetch_cart().await {
            Ok(view) => {
                let mut state = self.lock_state();
                let id = view.cart_id.unwrap_or_else(|| state.id());
                let cart = Cart::from_items(id, view.items)?;
                *state = Arc::new(cart);
                Ok(summarize(state.items(), &self.policy))
            }
            Err(err) => Err(into_cart_error(err)),
        };

        drop(guard);
        result
    }

    fn lock_state(&self) -> MutexGuard<'_, Arc<Cart>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, InFlightMap> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a settled change to the local cart.
    fn apply(&self, change: impl FnOnce(&mut Cart)) {
        let mut state = self.lock_state();
        change(Arc::make_mut(&mut state));
    }

    /// Claim an in-flight slot. Callers hold the state lock so that the
    /// claim and the optimistic update happen together.
    fn claim(&self, key: InFlightKey) -> Result<InFlightGuard<'_>, CartError> {
        let mut map = self.lock_in_flight();

        match key {
            InFlightKey::Line(id) => {
                if map.contains_key(&InFlightKey::Cart) {
                    return Err(CartError::CartBusy);
                }
                if map.contains_key(&key) {
                    return Err(CartError::ConcurrentModification(id));
                }
            }
            InFlightKey::Cart => {
                if !map.is_empty() {
                    return Err(CartError::CartBusy);
                }
            }
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        map.insert(key, token);

        Ok(InFlightGuard {
            map: &self.in_flight,
            key,
            token,
        })
    }
}

/// Classification shared by every operation; operation-specific handling of
/// `NotFound` and `Conflict` happens before this.
fn into_cart_error(err: SyncError) -> CartError {
    match err {
        SyncError::NotFound(message)
        | SyncError::Conflict(message)
        | SyncError::Rejected { message, .. } => CartError::Validation(message),
        other => CartError::Network(other.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::VecDeque;

    use tokio::sync::oneshot;
    use verdant_core::{CartView, Price, ProductId};

    use super::*;

    /// Scripted outcome for the next call of a given kind.
    enum Reply {
        /// Echo the request as the server's acknowledgement.
        Ok,
        NotFound,
        Conflict,
        Server,
        /// Wait for the sender to fire, then echo.
        Gate(oneshot::Receiver<()>),
    }

    #[derive(Default)]
    struct FakeSync {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<String>>,
        remote: Mutex<Vec<LineItem>>,
    }

    impl FakeSync {
        fn script(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Self::default()
            }
        }

        fn push(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn next(&self, call: String) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(call);
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Ok);
            match reply {
                Reply::Ok => Ok(()),
                Reply::NotFound => Err(SyncError::NotFound("missing".to_string())),
                Reply::Conflict => Err(SyncError::Conflict("sold out".to_string())),
                Reply::Server => Err(SyncError::Server {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
                Reply::Gate(rx) => {
                    let _ = rx.await;
                    Ok(())
                }
            }
        }
    }

    impl CartSync for FakeSync {
        async fn fetch_cart(&self) -> Result<CartView, SyncError> {
            self.next("fetch".to_string()).await?;
            let items = self.remote.lock().unwrap().clone();
            Ok(CartView {
                cart_id: None,
                summary: summarize(&items, &PricingPolicy::default()),
                items,
            })
        }

        async fn add_item(&self, request: &AddItemRequest) -> Result<LineItem, SyncError> {
            self.next(format!("add {}", request.product_id)).await?;
            let mut remote = self.remote.lock().unwrap();
            if let Some(line) = remote
                .iter_mut()
                .find(|line| line.product_id == request.product_id)
            {
                line.quantity += request.quantity;
                return Ok(line.clone());
            }
            let line = LineItem {
                id: request.line_item_id.unwrap_or_else(LineItemId::generate),
                product_id: request.product_id,
                quantity: request.quantity,
                product: plant(request.product_id.as_i32(), 1000, None).snapshot(),
            };
            remote.push(line.clone());
            Ok(line)
        }

        async fn update_quantity(&self, id: LineItemId, quantity: u32) -> Result<LineItem, SyncError> {
            self.next(format!("update {quantity}")).await?;
            let mut remote = self.remote.lock().unwrap();
            let line = remote
                .iter_mut()
                .find(|line| line.id == id)
                .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
            line.quantity = quantity;
            Ok(line.clone())
        }

        async fn remove_item(&self, id: LineItemId) -> Result<(), SyncError> {
            self.next("remove".to_string()).await?;
            self.remote.lock().unwrap().retain(|line| line.id != id);
            Ok(())
        }

        async fn clear(&self) -> Result<(), SyncError> {
            self.next("clear".to_string()).await?;
            self.remote.lock().unwrap().clear();
            Ok(())
        }
    }

    fn plant(id: i32, cents: i64, stock: Option<u32>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Plant {id}"),
            slug: format!("plant-{id}"),
            description: String::new(),
            price: Price::usd_cents(cents),
            compare_at_price: None,
            image_url: None,
            sku: format!("SKU-{id}"),
            stock,
            category_id: None,
            tags: Vec::new(),
        }
    }

    fn store(sync: FakeSync) -> CartStore<FakeSync> {
        CartStore::new(sync, PricingPolicy::default())
    }

    #[tokio::test]
    async fn test_add_then_summary() {
        let store = store(FakeSync::default());
        let line = store.add(&plant(42, 1000, None), 2).await.unwrap();
        assert_eq!(line.quantity, 2);

        let summary = store.summary();
        assert_eq!(summary.subtotal.to_string(), "20.00");
        assert_eq!(summary.shipping_fee.to_string(), "5.99");
        assert_eq!(summary.tax.to_string(), "1.40");
        assert_eq!(summary.total.to_string(), "27.39");
    }

    #[tokio::test]
    async fn test_add_zero_is_rejected_without_sync() {
        let store = store(FakeSync::default());
        let err = store.add(&plant(1, 1000, None), 0).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert!(store.sync().calls().is_empty());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_add_same_product_merges_into_one_line() {
        let store = store(FakeSync::default());
        let first = store.add(&plant(1, 1000, None), 1).await.unwrap();
        let second = store.add(&plant(1, 1000, None), 2).await.unwrap();
        assert_eq!(first.id, second.id);
        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_add_failure_rolls_back_only_that_line() {
        let store = store(FakeSync::default());
        let kept = store.add(&plant(1, 1000, None), 1).await.unwrap();

        store.sync().push(Reply::Server);
        let err = store.add(&plant(2, 500, None), 1).await.unwrap_err();
        assert!(matches!(err, CartError::Network(_)));
        assert!(err.is_retryable());

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_add_failure_restores_previous_quantity() {
        let store = store(FakeSync::default());
        store.add(&plant(1, 1000, None), 2).await.unwrap();

        store.sync().push(Reply::Server);
        store.add(&plant(1, 1000, None), 3).await.unwrap_err();
        assert_eq!(store.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_conflict_reports_unavailable() {
        let store = store(FakeSync::script([Reply::Conflict]));
        let err = store.add(&plant(9, 1000, None), 1).await.unwrap_err();
        assert_eq!(err, CartError::ProductUnavailable(ProductId::new(9)));
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_zero_leaves_line_unchanged() {
        let store = store(FakeSync::default());
        let line = store.add(&plant(42, 1000, None), 2).await.unwrap();

        let err = store.update_quantity(line.id, 0).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert_eq!(store.items()[0].quantity, 2);
        assert_eq!(store.sync().calls(), vec!["add 42"]);
    }

    #[tokio::test]
    async fn test_update_quantity_rolls_back_on_network_error() {
        let store = store(FakeSync::default());
        let line = store.add(&plant(42, 1000, None), 2).await.unwrap();

        store.sync().push(Reply::Server);
        let err = store.update_quantity(line.id, 5).await.unwrap_err();
        assert!(matches!(err, CartError::Network(_)));
        assert_eq!(store.items()[0].quantity, 2);
        assert!(!store.is_in_flight(line.id));
    }

    #[tokio::test]
    async fn test_update_quantity_not_found_removes_locally() {
        let store = store(FakeSync::default());
        let line = store.add(&plant(42, 1000, None), 2).await.unwrap();

        store.sync().push(Reply::NotFound);
        let err = store.update_quantity(line.id, 3).await.unwrap_err();
        assert_eq!(err, CartError::NotFound(line.id));
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_updates_on_same_line() {
        let store = Arc::new(store(FakeSync::default()));
        let line = store.add(&plant(42, 1000, None), 1).await.unwrap();

        let (release, gate) = oneshot::channel();
        store.sync().push(Reply::Gate(gate));

        let first = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.update_quantity(line.id, 3).await }
        });
        while !store.is_in_flight(line.id) {
            tokio::task::yield_now().await;
        }

        let second = store.update_quantity(line.id, 7).await.unwrap_err();
        assert_eq!(second, CartError::ConcurrentModification(line.id));
        assert!(matches!(
            store.remove(line.id).await,
            Err(CartError::ConcurrentModification(_))
        ));

        release.send(()).unwrap();
        let first = first.await.unwrap().unwrap();
        assert_eq!(first.quantity, 3);
        assert_eq!(store.items()[0].quantity, 3);
        assert!(!store.is_in_flight(line.id));
    }

    #[tokio::test]
    async fn test_distinct_lines_mutate_concurrently() {
        let store = Arc::new(store(FakeSync::default()));
        let a = store.add(&plant(1, 1000, None), 1).await.unwrap();
        let b = store.add(&plant(2, 1000, None), 1).await.unwrap();

        let (release, gate) = oneshot::channel();
        store.sync().push(Reply::Gate(gate));
        let pending = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.update_quantity(a.id, 4).await }
        });
        while !store.is_in_flight(a.id) {
            tokio::task::yield_now().await;
        }

        store.update_quantity(b.id, 2).await.unwrap();
        assert!(matches!(store.clear().await, Err(CartError::CartBusy)));

        release.send(()).unwrap();
        pending.await.unwrap().unwrap();
        let quantities: Vec<_> = store.items().iter().map(|item| item.quantity).collect();
        assert_eq!(quantities, vec![4, 2]);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let store = store(FakeSync::default());
        let line = store.add(&plant(1, 1000, None), 1).await.unwrap();

        store.remove(line.id).await.unwrap();
        store.remove(line.id).await.unwrap();
        assert!(store.items().is_empty());
        assert_eq!(store.sync().calls(), vec!["add 1", "remove"]);
    }

    #[tokio::test]
    async fn test_remove_not_found_counts_as_removed() {
        let store = store(FakeSync::default());
        let line = store.add(&plant(1, 1000, None), 1).await.unwrap();
        store.sync().push(Reply::NotFound);
        store.remove(line.id).await.unwrap();
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_remove_failure_restores_position() {
        let store = store(FakeSync::default());
        let ids: Vec<_> = [
            store.add(&plant(1, 100, None), 1).await.unwrap().id,
            store.add(&plant(2, 100, None), 1).await.unwrap().id,
            store.add(&plant(3, 100, None), 1).await.unwrap().id,
        ]
        .to_vec();

        store.sync().push(Reply::Server);
        store.remove(ids[1]).await.unwrap_err();
        let order: Vec<_> = store.items().iter().map(|item| item.id).collect();
        assert_eq!(order, ids);
    }

    #[tokio::test]
    async fn test_clear_failure_restores_whole_cart() {
        let store = store(FakeSync::default());
        store.add(&plant(1, 1000, None), 1).await.unwrap();
        store.add(&plant(2, 1000, None), 1).await.unwrap();

        store.sync().push(Reply::Server);
        store.clear().await.unwrap_err();
        assert_eq!(store.items().len(), 2);

        store.clear().await.unwrap();
        assert!(store.items().is_empty());
        assert_eq!(store.summary().total.to_string(), "0");
    }

    #[tokio::test]
    async fn test_refresh_replaces_local_cart() {
        let store = store(FakeSync::default());
        store.add(&plant(1, 1000, None), 1).await.unwrap();

        // drift: the server dropped our line and holds a different one
        {
            let mut remote = store.sync().remote.lock().unwrap();
            remote.clear();
            remote.push(LineItem {
                id: LineItemId::generate(),
                product_id: ProductId::new(5),
                quantity: 6,
                product: plant(5, 1000, None).snapshot(),
            });
        }

        let summary = store.refresh().await.unwrap();
        assert_eq!(summary.item_count, 6);
        assert_eq!(summary.shipping_fee.to_string(), "0");
        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(5));
    }
}
