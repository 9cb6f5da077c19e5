//! Cart total aggregation.

use common::{CartItem, Money, UserId};
use document_store::{AggregateRow, DocumentStore, Pipeline};
use serde::Serialize;

use crate::error::{CommerceError, Result};
use crate::store_call::StoreGateway;

/// Aggregated view of a user's live cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    /// Sum of item prices.
    pub total: Money,

    /// Items in cart order.
    pub items: Vec<CartItem>,
}

/// Computes cart totals with the unwind + grouped-sum pipeline.
///
/// Empty carts produce no aggregation rows. That is a legitimate state and
/// is reported as a zero total, never as an error.
#[derive(Clone)]
pub struct CartTotals<S> {
    gateway: StoreGateway<S>,
}

impl<S: DocumentStore> CartTotals<S> {
    pub fn new(gateway: StoreGateway<S>) -> Self {
        Self { gateway }
    }

    /// Returns the total price and the items of a user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn compute_cart_total(&self, user_id: UserId) -> Result<CartSummary> {
        let user = self.gateway.load_user(user_id).await?;
        let total = self.total_for(user_id).await?;

        Ok(CartSummary {
            total,
            items: user.user.cart,
        })
    }

    /// Runs the pipeline alone, without loading the cart items.
    pub async fn total_for(&self, user_id: UserId) -> Result<Money> {
        let rows = self.gateway.aggregate(Pipeline::cart_total(user_id)).await?;
        fold_rows(user_id, &rows)
    }
}

fn fold_rows(user_id: UserId, rows: &[AggregateRow]) -> Result<Money> {
    match rows {
        [] => Ok(Money::zero()),
        [row] if row.user_id == user_id => Ok(row.as_money()),
        [row] => Err(CommerceError::DecodeFailure(format!(
            "cart aggregation for user {user_id} returned group {}",
            row.user_id
        ))),
        _ => Err(CommerceError::DecodeFailure(format!(
            "cart aggregation for user {user_id} returned {} groups",
            rows.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EngineSettings;
    use crate::test_support::{seed_product, seed_user};
    use document_store::{DocumentStoreExt, InMemoryDocumentStore, UserUpdate};

    fn totals(store: &InMemoryDocumentStore) -> CartTotals<InMemoryDocumentStore> {
        CartTotals::new(StoreGateway::new(store.clone(), &EngineSettings::default()))
    }

    #[test]
    fn no_rows_is_zero() {
        assert_eq!(fold_rows(UserId::new(), &[]).unwrap(), Money::zero());
    }

    #[test]
    fn several_rows_is_a_decode_failure() {
        let user_id = UserId::new();
        let row = AggregateRow { user_id, value: 1 };
        assert!(matches!(
            fold_rows(user_id, &[row, row]),
            Err(CommerceError::DecodeFailure(_))
        ));
    }

    #[test]
    fn foreign_group_key_is_a_decode_failure() {
        let row = AggregateRow {
            user_id: UserId::new(),
            value: 1,
        };
        assert!(matches!(
            fold_rows(UserId::new(), &[row]),
            Err(CommerceError::DecodeFailure(_))
        ));
    }

    #[tokio::test]
    async fn empty_cart_is_zero_not_an_error() {
        let store = InMemoryDocumentStore::new();
        let user_id = seed_user(&store).await;

        let summary = totals(&store).compute_cart_total(user_id).await.unwrap();
        assert_eq!(summary.total, Money::zero());
        assert!(summary.items.is_empty());
    }

    #[tokio::test]
    async fn sums_fractional_prices_exactly() {
        let store = InMemoryDocumentStore::new();
        let user_id = seed_user(&store).await;
        for cents in [199, 1, 370] {
            let product = seed_product(&store, "Item", cents).await;
            store
                .update_user_once(user_id, UserUpdate::PushCartItem((&product).into()))
                .await
                .unwrap();
        }

        let summary = totals(&store).compute_cart_total(user_id).await.unwrap();
        assert_eq!(summary.total, Money::from_cents(570));
        assert_eq!(summary.items.len(), 3);
    }

    #[tokio::test]
    async fn overflowing_total_is_a_decode_failure() {
        let store = InMemoryDocumentStore::new();
        let user_id = seed_user(&store).await;
        let yacht = seed_product(&store, "Yacht", i64::MAX).await;
        for _ in 0..2 {
            store
                .update_user_once(user_id, UserUpdate::PushCartItem((&yacht).into()))
                .await
                .unwrap();
        }

        let result = totals(&store).compute_cart_total(user_id).await;
        assert!(matches!(result, Err(CommerceError::DecodeFailure(_))));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let result = totals(&store).compute_cart_total(UserId::new()).await;
        assert!(matches!(result, Err(CommerceError::UserNotFound(_))));
    }
}
