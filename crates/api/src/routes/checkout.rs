//! Checkout and instant buy endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{Money, Order, OrderId};
use document_store::DocumentStore;
use domain::{parse_product_id, parse_user_id};
use serde::Serialize;

use super::{Params, required};
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct OrderPlacedResponse {
    pub message: &'static str,
    pub order_id: OrderId,
    /// Total in cents.
    pub total: Money,
}

impl From<Order> for OrderPlacedResponse {
    fn from(order: Order) -> Self {
        Self {
            message: "Successfully placed the order",
            order_id: order.order_id,
            total: order.total_price,
        }
    }
}

/// GET /cartcheckout?userId= — turn the cart into an order.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<OrderPlacedResponse>, ApiError> {
    let user_id = parse_user_id(required(&params, "userId")?)?;

    let order = state.checkout.checkout(user_id).await?;
    Ok(Json(order.into()))
}

/// GET /instantbuy?id=&userId= — order one product without the cart.
#[tracing::instrument(skip(state))]
pub async fn instant_buy<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<OrderPlacedResponse>, ApiError> {
    let product_id = parse_product_id(required(&params, "id")?)?;
    let user_id = parse_user_id(required(&params, "userId")?)?;

    let order = state.checkout.instant_buy(product_id, user_id).await?;
    Ok(Json(order.into()))
}
