//! Checkout and order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{AddressId, OrderId};
use domain::PlaceOrder;
use serde::{Deserialize, Serialize};
use store::{CheckoutStore, Order};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;

use super::AppState;
use super::addresses::AddressResponse;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub address_id: Uuid,
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_response_message: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub discount_cents: i64,
    pub ordered_price_cents: i64,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_response_message: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub total_amount_cents: i64,
    pub order_status: String,
    pub created_at: String,
    pub address: AddressResponse,
    pub items: Vec<OrderItemResponse>,
    pub payment: PaymentResponse,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            total_amount_cents: order.total_amount.cents(),
            order_status: order.status.to_string(),
            created_at: order.created_at.to_rfc3339(),
            address: order.address.into(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name,
                    quantity: item.quantity,
                    discount_cents: item.discount.cents(),
                    ordered_price_cents: item.ordered_price.cents(),
                })
                .collect(),
            payment: PaymentResponse {
                payment_method: order.payment.method,
                pg_name: order.payment.pg_name,
                pg_payment_id: order.payment.pg_payment_id,
                pg_status: order.payment.pg_status,
                pg_response_message: order.payment.pg_message,
            },
        }
    }
}

// -- Handlers --

/// POST /api/users/order — convert the current user's cart into an order.
#[tracing::instrument(skip(state, req))]
pub async fn place<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .checkout
        .place_order(
            user_id,
            PlaceOrder {
                address_id: AddressId::from_uuid(req.address_id),
                payment_method: req.payment_method,
                pg_name: req.pg_name,
                pg_payment_id: req.pg_payment_id,
                pg_status: req.pg_status,
                pg_message: req.pg_response_message,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders/{id} — load one of the current user's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let order = state.checkout.get_order(order_id).await?;

    // Orders are only visible to their owner.
    if order.user_id != user_id {
        return Err(ApiError::NotFound(format!("order {order_id} does not exist")));
    }

    Ok(Json(order.into()))
}

/// GET /api/users/orders — the current user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.checkout.list_orders(user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
