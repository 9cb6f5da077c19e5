//! Address book endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use common::{Address, AddressId, AddressSlot};
use document_store::DocumentStore;
use domain::parse_user_id;
use serde::{Deserialize, Serialize};

use super::{Params, required};
use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AddressRequest {
    pub house_name: String,
    pub street_name: String,
    pub city_name: String,
    pub pin_code: String,
}

impl From<AddressRequest> for Address {
    fn from(req: AddressRequest) -> Self {
        Address {
            address_id: AddressId::new(),
            house_name: req.house_name,
            street_name: req.street_name,
            city_name: req.city_name,
            pin_code: req.pin_code,
        }
    }
}

#[derive(Serialize)]
pub struct AddressResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<AddressSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// POST /addaddress?id= — store an address in the first free slot.
#[tracing::instrument(skip(state, body))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
    body: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<Json<AddressResponse>, ApiError> {
    let user_id = parse_user_id(required(&params, "id")?)?;
    let Json(req) = body?;

    let (slot, address) = state.addresses.add_address(user_id, req.into()).await?;

    Ok(Json(AddressResponse {
        message: "Successfully added the address",
        slot: Some(slot),
        address: Some(address),
    }))
}

/// PUT /edithomeaddress?id= — replace the home address.
#[tracing::instrument(skip(state, body))]
pub async fn edit_home<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
    body: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<Json<AddressResponse>, ApiError> {
    let user_id = parse_user_id(required(&params, "id")?)?;
    let Json(req) = body?;

    let address = state.addresses.edit_home_address(user_id, req.into()).await?;

    Ok(Json(AddressResponse {
        message: "Successfully updated the home address",
        slot: Some(AddressSlot::Home),
        address: Some(address),
    }))
}

/// PUT /editworkaddress?id= — replace the work address.
#[tracing::instrument(skip(state, body))]
pub async fn edit_work<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
    body: Result<Json<AddressRequest>, JsonRejection>,
) -> Result<Json<AddressResponse>, ApiError> {
    let user_id = parse_user_id(required(&params, "id")?)?;
    let Json(req) = body?;

    let address = state.addresses.edit_work_address(user_id, req.into()).await?;

    Ok(Json(AddressResponse {
        message: "Successfully updated the work address",
        slot: Some(AddressSlot::Work),
        address: Some(address),
    }))
}

/// GET /deleteaddresses?id= — empty both slots.
#[tracing::instrument(skip(state))]
pub async fn delete_all<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<Params>,
) -> Result<Json<AddressResponse>, ApiError> {
    let user_id = parse_user_id(required(&params, "id")?)?;

    state.addresses.delete_addresses(user_id).await?;

    Ok(Json(AddressResponse {
        message: "Successfully deleted all addresses",
        slot: None,
        address: None,
    }))
}
