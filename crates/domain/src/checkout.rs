//! Cart-to-order transition.
//!
//! A checkout reads the user document at version `v`, aggregates the cart
//! and then commits "append order, clear cart" as one update guarded by a
//! compare-and-swap on `v`. Any write to the user in between (a cart change
//! or a second checkout) makes the swap fail, so an order always matches
//! the cart it was built from and a cart is ordered at most once.

use std::time::Instant;

use chrono::Utc;
use common::{CartItem, Money, Order, PaymentMethod, ProductId, UserId};
use document_store::{DocumentStore, Pipeline, UpdateOptions, UserUpdate, VersionedUser};

use crate::cart::CartTotals;
use crate::error::{CommerceError, Result};
use crate::settings::{EmptyCartPolicy, EngineSettings};
use crate::store_call::StoreGateway;

/// Places orders from a user's cart or from a single catalog product.
#[derive(Clone)]
pub struct CheckoutService<S> {
    gateway: StoreGateway<S>,
    totals: CartTotals<S>,
    empty_cart_policy: EmptyCartPolicy,
    payment_method: PaymentMethod,
}

impl<S: DocumentStore + Clone> CheckoutService<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        let gateway = StoreGateway::new(store, settings);
        Self {
            totals: CartTotals::new(gateway.clone()),
            gateway,
            empty_cart_policy: settings.empty_cart_policy,
            payment_method: settings.default_payment_method,
        }
    }

    /// Turns the user's cart into an order and empties the cart.
    ///
    /// Not idempotent. After a `ConcurrentModification` nothing was written
    /// and the call may be repeated; after a `StoreTimeout` the order may
    /// exist, so check the history first.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Order> {
        let started = Instant::now();
        metrics::counter!("checkouts_total").increment(1);

        let result = self.place_from_cart(user_id).await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_created_total", "source" => "cart").increment(1);
                tracing::info!(
                    %user_id,
                    order_id = %order.order_id,
                    total = %order.total_price,
                    items = order.order_list.len(),
                    "checkout completed"
                );
            }
            Err(CommerceError::ConcurrentModification(_)) => {
                metrics::counter!("checkout_conflicts_total").increment(1);
                tracing::warn!(%user_id, "checkout lost a race, nothing written");
            }
            Err(e) => tracing::debug!(%user_id, code = e.code(), "checkout failed"),
        }
        result
    }

    async fn place_from_cart(&self, user_id: UserId) -> Result<Order> {
        let VersionedUser { user, version } = self.gateway.load_user(user_id).await?;
        let total = self.totals.total_for(user_id).await?;

        // The aggregation runs after the read; a cart write in between shows
        // up as a mismatch here or as a failed swap below.
        let snapshot_total = Money::checked_sum(user.cart.iter().map(|item| item.price))
            .ok_or_else(|| {
                CommerceError::DecodeFailure(format!("cart total for user {user_id} overflows"))
            })?;
        if total != snapshot_total {
            return Err(CommerceError::ConcurrentModification(user_id));
        }

        if user.cart.is_empty() && self.empty_cart_policy == EmptyCartPolicy::Reject {
            return Err(CommerceError::EmptyCart);
        }

        let now = Utc::now();
        let order = Order::place(user.cart, total, self.payment_method, now);

        self.gateway
            .commit(
                user_id,
                vec![
                    UserUpdate::PushOrder(order.clone()),
                    UserUpdate::ClearCart,
                    UserUpdate::Touch(now),
                ],
                UpdateOptions::expect_version(version),
            )
            .await?;

        Ok(order)
    }

    /// Orders one catalog product directly. The live cart is not touched.
    #[tracing::instrument(skip(self))]
    pub async fn instant_buy(&self, product_id: ProductId, user_id: UserId) -> Result<Order> {
        let product = self.gateway.load_product(product_id).await?;
        let now = Utc::now();
        let order = Order::place(
            vec![CartItem::from(&product)],
            product.price,
            self.payment_method,
            now,
        );

        self.gateway
            .commit(
                user_id,
                vec![UserUpdate::PushOrder(order.clone()), UserUpdate::Touch(now)],
                UpdateOptions::new(),
            )
            .await?;

        metrics::counter!("orders_created_total", "source" => "instant_buy").increment(1);
        tracing::info!(%user_id, %product_id, order_id = %order.order_id, "instant buy completed");
        Ok(order)
    }

    /// Number of orders in the user's history.
    pub async fn order_count(&self, user_id: UserId) -> Result<u64> {
        let rows = self.gateway.aggregate(Pipeline::order_count(user_id)).await?;
        match rows.as_slice() {
            [] => Ok(0),
            [row] => u64::try_from(row.value).map_err(|_| {
                CommerceError::DecodeFailure(format!("negative order count {}", row.value))
            }),
            _ => Err(CommerceError::DecodeFailure(format!(
                "order count for user {user_id} returned {} groups",
                rows.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use crate::test_support::{seed_product, seed_user};
    use document_store::{DocumentStoreExt, InMemoryDocumentStore};

    struct Fixture {
        store: InMemoryDocumentStore,
        carts: CartService<InMemoryDocumentStore>,
        checkout: CheckoutService<InMemoryDocumentStore>,
    }

    fn fixture(settings: EngineSettings) -> Fixture {
        let store = InMemoryDocumentStore::new();
        Fixture {
            carts: CartService::new(store.clone(), &settings),
            checkout: CheckoutService::new(store.clone(), &settings),
            store,
        }
    }

    #[tokio::test]
    async fn checkout_moves_cart_into_order() {
        let f = fixture(EngineSettings::default());
        let user_id = seed_user(&f.store).await;
        let laptop = seed_product(&f.store, "Laptop", 250).await;
        let mouse = seed_product(&f.store, "Mouse", 100).await;
        f.carts.add_to_cart(laptop.product_id, user_id).await.unwrap();
        f.carts.add_to_cart(mouse.product_id, user_id).await.unwrap();

        let order = f.checkout.checkout(user_id).await.unwrap();
        assert_eq!(order.total_price, Money::from_cents(350));
        assert_eq!(order.order_list.len(), 2);
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);

        let user = f.store.get_user(user_id).await.unwrap().unwrap().user;
        assert!(user.cart.is_empty());
        assert_eq!(user.orders, vec![order]);
        assert_eq!(f.checkout.order_count(user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_by_default() {
        let f = fixture(EngineSettings::default());
        let user_id = seed_user(&f.store).await;

        let result = f.checkout.checkout(user_id).await;
        assert!(matches!(result, Err(CommerceError::EmptyCart)));
        assert_eq!(f.checkout.order_count(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_cart_allowed_yields_zero_order() {
        let f = fixture(
            EngineSettings::default().with_empty_cart_policy(EmptyCartPolicy::AllowZeroTotal),
        );
        let user_id = seed_user(&f.store).await;

        let order = f.checkout.checkout(user_id).await.unwrap();
        assert!(order.total_price.is_zero());
        assert!(order.order_list.is_empty());
    }

    #[tokio::test]
    async fn overflowing_cart_fails_without_an_order() {
        let f = fixture(EngineSettings::default());
        let user_id = seed_user(&f.store).await;
        let yacht = seed_product(&f.store, "Yacht", i64::MAX).await;
        f.carts.add_to_cart(yacht.product_id, user_id).await.unwrap();
        f.carts.add_to_cart(yacht.product_id, user_id).await.unwrap();

        let result = f.checkout.checkout(user_id).await;
        assert!(matches!(result, Err(CommerceError::DecodeFailure(_))));

        let user = f.store.get_user(user_id).await.unwrap().unwrap().user;
        assert_eq!(user.cart.len(), 2);
        assert!(user.orders.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_leaves_cart_and_history() {
        let f = fixture(EngineSettings::default());
        let user_id = seed_user(&f.store).await;
        let desk = seed_product(&f.store, "Desk", 12_000).await;
        f.carts.add_to_cart(desk.product_id, user_id).await.unwrap();

        f.store.fail_next_updates(1);
        let result = f.checkout.checkout(user_id).await;
        assert!(matches!(result, Err(CommerceError::UpdateFailed(_))));

        let user = f.store.get_user(user_id).await.unwrap().unwrap().user;
        assert_eq!(user.cart.len(), 1);
        assert!(user.orders.is_empty());
    }

    #[tokio::test]
    async fn instant_buy_leaves_cart_alone() {
        let f = fixture(EngineSettings::default());
        let user_id = seed_user(&f.store).await;
        let pen = seed_product(&f.store, "Pen", 150).await;
        let book = seed_product(&f.store, "Book", 1_999).await;
        f.carts.add_to_cart(pen.product_id, user_id).await.unwrap();

        let order = f.checkout.instant_buy(book.product_id, user_id).await.unwrap();
        assert_eq!(order.total_price, Money::from_cents(1_999));
        assert_eq!(order.order_list[0].product_id, book.product_id);

        let user = f.store.get_user(user_id).await.unwrap().unwrap().user;
        assert_eq!(user.cart.len(), 1);
        assert_eq!(user.orders.len(), 1);
    }

    #[tokio::test]
    async fn instant_buy_unknown_product() {
        let f = fixture(EngineSettings::default());
        let user_id = seed_user(&f.store).await;

        let result = f.checkout.instant_buy(ProductId::new(), user_id).await;
        assert!(matches!(result, Err(CommerceError::ProductNotFound(_))));
    }
}
