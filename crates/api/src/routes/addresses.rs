//! Delivery address endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::AddressId;
use domain::NewAddress;
use serde::{Deserialize, Serialize};
use store::{Address, CheckoutStore};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;

use super::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub street: String,
    #[serde(default)]
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct AddressResponse {
    pub address_id: String,
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            address_id: address.id.to_string(),
            street: address.street,
            building_name: address.building_name,
            city: address.city,
            state: address.state,
            country: address.country,
            zip_code: address.zip_code,
        }
    }
}

// -- Handlers --

/// POST /api/addresses — add a delivery address for the current user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(req): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>), ApiError> {
    if req.street.trim().is_empty() {
        return Err(ApiError::BadRequest("street is required".to_string()));
    }
    if req.zip_code.len() < 5 {
        return Err(ApiError::BadRequest(
            "zip code must be at least 5 characters".to_string(),
        ));
    }

    let address = state
        .addresses
        .create_address(
            user_id,
            NewAddress {
                street: req.street,
                building_name: req.building_name,
                city: req.city,
                state: req.state,
                country: req.country,
                zip_code: req.zip_code,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(address.into())))
}

/// GET /api/addresses — the current user's addresses.
#[tracing::instrument(skip(state))]
pub async fn list<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<Vec<AddressResponse>>, ApiError> {
    let addresses = state.addresses.list_addresses(user_id).await?;
    Ok(Json(addresses.into_iter().map(AddressResponse::from).collect()))
}

/// GET /api/addresses/{id} — load one of the current user's addresses.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AddressResponse>, ApiError> {
    let address = state
        .addresses
        .get_address(AddressId::from_uuid(id), user_id)
        .await?;
    Ok(Json(address.into()))
}

/// DELETE /api/addresses/{id} — remove one of the current user's addresses.
#[tracing::instrument(skip(state))]
pub async fn remove<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .addresses
        .delete_address(AddressId::from_uuid(id), user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
