//! Registration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use common::{UserId, UserProfile};
use document_store::DocumentStore;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
}

/// POST /users/signup — register a profile.
#[tracing::instrument(skip(state, body))]
pub async fn signup<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<UserProfile>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(profile) = body?;
    let user = state.users.register(profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.user_id,
        }),
    ))
}
