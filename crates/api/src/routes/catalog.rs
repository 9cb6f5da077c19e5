//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::{NewProduct, Product};
use document_store::DocumentStore;

use super::{Params, required};
use crate::AppState;
use crate::error::ApiError;

/// POST /admin/addproduct — add a product to the catalog.
#[tracing::instrument(skip(state, body))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(new_product) = body?;
    let product = state.catalog.add_product(new_product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /users/productview — every product.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products().await?))
}

/// GET /users/search?name= — products whose name contains `name`.
#[tracing::instrument(skip(state))]
pub async fn search<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let name = required(&params, "name")?;
    Ok(Json(state.catalog.search_products(name).await?))
}
