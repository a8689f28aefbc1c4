//! Cart endpoints, including checkout.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::{PaymentGateway, PricedCart};
use domain::{Address, ProductId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::{AppState, parse_line_id, parse_user_id};

use super::orders::OrderResponse;

#[derive(Deserialize)]
pub struct AddLineRequest {
    pub product_id: String,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateLineRequest {
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Address,
}

/// GET /carts/:user_id — the user's cart with live-priced totals.
#[tracing::instrument(skip(state))]
pub async fn get<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(user_id): Path<String>,
) -> Result<Json<PricedCart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(state.carts.get(user_id).await?))
}

/// POST /carts/:user_id/lines — add quantity for a product variant.
#[tracing::instrument(skip(state, req))]
pub async fn add_line<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(user_id): Path<String>,
    Json(req): Json<AddLineRequest>,
) -> Result<Json<PricedCart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let cart = state
        .carts
        .add_line(
            user_id,
            ProductId::from(req.product_id),
            req.quantity,
            req.color,
            req.size,
        )
        .await?;
    Ok(Json(cart))
}

/// PUT /carts/:user_id/lines/:line_id — set a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_line<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path((user_id, line_id)): Path<(String, String)>,
    Json(req): Json<UpdateLineRequest>,
) -> Result<Json<PricedCart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let line_id = parse_line_id(&line_id)?;
    let cart = state
        .carts
        .update_line_quantity(user_id, line_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /carts/:user_id/lines/:line_id — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove_line<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path((user_id, line_id)): Path<(String, String)>,
) -> Result<Json<PricedCart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let line_id = parse_line_id(&line_id)?;
    Ok(Json(state.carts.remove_line(user_id, line_id).await?))
}

/// DELETE /carts/:user_id — empty the cart.
#[tracing::instrument(skip(state))]
pub async fn clear<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(user_id): Path<String>,
) -> Result<Json<PricedCart>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    Ok(Json(state.carts.clear(user_id).await?))
}

/// POST /carts/:user_id/checkout — convert the cart into a pending order.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(user_id): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let order = state
        .checkout
        .checkout(user_id, req.shipping_address)
        .await?;
    Ok((
        axum::http::StatusCode::CREATED,
        Json(OrderResponse::from_order(&order)),
    ))
}
