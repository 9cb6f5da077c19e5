//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::{CartItem, Money};
use document_store::DocumentStore;
use domain::{parse_product_id, parse_user_id};
use serde::Serialize;

use super::{Params, required};
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct CartResponse {
    /// Total in cents.
    pub total: Money,
    #[serde(rename = "userCart")]
    pub user_cart: Vec<CartItem>,
}

/// GET /addtocart?id=&userID= — append a product snapshot to the cart.
#[tracing::instrument(skip(state))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<MessageResponse>, ApiError> {
    let product_id = parse_product_id(required(&params, "id")?)?;
    let user_id = parse_user_id(required(&params, "userID")?)?;

    state.carts.add_to_cart(product_id, user_id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully added to the cart",
    }))
}

/// GET /removeitem?id=&userId= — remove every line item for a product.
#[tracing::instrument(skip(state))]
pub async fn remove<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<MessageResponse>, ApiError> {
    let product_id = parse_product_id(required(&params, "id")?)?;
    let user_id = parse_user_id(required(&params, "userId")?)?;

    state.carts.remove_from_cart(product_id, user_id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully removed item from cart",
    }))
}

/// GET /listcart?id= — cart items and their total. An empty cart totals 0.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<CartResponse>, ApiError> {
    let user_id = parse_user_id(required(&params, "id")?)?;

    let summary = state.carts.totals().compute_cart_total(user_id).await?;

    Ok(Json(CartResponse {
        total: summary.total,
        user_cart: summary.items,
    }))
}
