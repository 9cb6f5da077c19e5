//! Cart mutation and aggregation engines.

mod totals;

pub use totals::{CartSummary, CartTotals};

use chrono::Utc;
use common::{CartItem, ProductId, UserId};
use document_store::{DocumentStore, UpdateOptions, UserUpdate};

use crate::error::Result;
use crate::settings::EngineSettings;
use crate::store_call::StoreGateway;

/// Adds and removes cart items.
///
/// Each mutation is a single atomic update of one user document; the
/// catalog is only read.
#[derive(Clone)]
pub struct CartService<S> {
    gateway: StoreGateway<S>,
}

impl<S: DocumentStore + Clone> CartService<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            gateway: StoreGateway::new(store, settings),
        }
    }

    /// Returns a totals engine sharing this service's store.
    pub fn totals(&self) -> CartTotals<S> {
        CartTotals::new(self.gateway.clone())
    }

    /// Appends a snapshot of the product to the user's cart.
    ///
    /// Adding the same product twice yields two line items.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId, user_id: UserId) -> Result<CartItem> {
        let product = self.gateway.load_product(product_id).await?;
        let item = CartItem::from(&product);

        self.gateway
            .commit(
                user_id,
                vec![
                    UserUpdate::PushCartItem(item.clone()),
                    UserUpdate::Touch(Utc::now()),
                ],
                UpdateOptions::new(),
            )
            .await?;

        metrics::counter!("cart_items_added_total").increment(1);
        tracing::info!(%user_id, %product_id, price = %item.price, "item added to cart");
        Ok(item)
    }

    /// Removes every line item for the product. Removing an absent product
    /// is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId, user_id: UserId) -> Result<()> {
        self.gateway
            .commit(
                user_id,
                vec![
                    UserUpdate::PullCartItems(product_id),
                    UserUpdate::Touch(Utc::now()),
                ],
                UpdateOptions::new(),
            )
            .await?;

        metrics::counter!("cart_items_removed_total").increment(1);
        tracing::info!(%user_id, %product_id, "item removed from cart");
        Ok(())
    }
}
