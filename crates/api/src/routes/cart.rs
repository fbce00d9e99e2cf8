//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::QuantityChange;
use serde::Serialize;
use store::{Cart, CheckoutStore};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;

use super::AppState;

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: String,
    pub total_price_cents: i64,
    pub items: Vec<CartItemResponse>,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            cart_id: cart.id.to_string(),
            total_price_cents: cart.total_price.cents(),
            items: cart
                .lines
                .into_iter()
                .map(|line| CartItemResponse {
                    product_id: line.product_id.to_string(),
                    product_name: line.product_name,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                    discount_cents: line.discount.cents(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /api/carts/products/{product_id}/quantity/{quantity} — add a product
/// to the current user's cart.
#[tracing::instrument(skip(state))]
pub async fn add_product<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path((product_id, quantity)): Path<(Uuid, u32)>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    if quantity == 0 {
        return Err(ApiError::BadRequest(
            "quantity must be a positive integer".to_string(),
        ));
    }

    let cart = state
        .carts
        .add_product(user_id, ProductId::from_uuid(product_id), quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(cart.into())))
}

/// GET /api/carts/users/cart — the current user's cart.
#[tracing::instrument(skip(state))]
pub async fn get_cart<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_cart(user_id).await?;
    Ok(Json(cart.into()))
}

/// PUT /api/cart/products/{product_id}/quantity/{operation} — step a line's
/// quantity. `operation` of `delete` decrements; anything else increments.
#[tracing::instrument(skip(state))]
pub async fn update_quantity<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path((product_id, operation)): Path<(Uuid, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let change = if operation.eq_ignore_ascii_case("delete") {
        QuantityChange::Decrement
    } else {
        QuantityChange::Increment
    };

    let cart = state
        .carts
        .adjust_quantity(user_id, ProductId::from_uuid(product_id), change)
        .await?;

    Ok(Json(cart.into()))
}

/// DELETE /api/carts/product/{product_id} — remove a line from the cart.
#[tracing::instrument(skip(state))]
pub async fn remove_product<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_product(user_id, ProductId::from_uuid(product_id))
        .await?;

    Ok(Json(cart.into()))
}
