//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Money, ProductId};
use domain::NewProduct;
use serde::{Deserialize, Serialize};
use store::{CheckoutStore, Product};
use uuid::Uuid;

use crate::error::ApiError;

use super::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    pub price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price_cents: i64,
    pub discount_cents: i64,
    pub special_price_cents: i64,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            product_id: product.id.to_string(),
            name: product.name,
            description: product.description,
            quantity: product.quantity,
            price_cents: product.price.cents(),
            discount_cents: product.discount.cents(),
            special_price_cents: product.special_price.cents(),
        }
    }
}

// -- Handlers --

/// POST /api/products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("product name is required".to_string()));
    }

    let product = state
        .catalog
        .create_product(NewProduct {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            price: Money::from_cents(req.price_cents),
            discount: Money::from_cents(req.discount_cents),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// GET /api/products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /api/products/{id} — load a product.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(ProductId::from_uuid(id)).await?;
    Ok(Json(product.into()))
}
