//! Order read and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::PaymentGateway;
use domain::{Address, Order, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, parse_order_id, parse_user_id};

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineResponse>,
    pub total_cents: i64,
    pub shipping_address: Address,
    pub tracking_number: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
    pub thumbnail: Option<String>,
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            customer_name: order.customer_name().to_string(),
            status: order.status(),
            lines: order
                .lines()
                .iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product_id.to_string(),
                    name: line.name.clone(),
                    unit_price_cents: line.unit_price.cents(),
                    quantity: line.quantity,
                    color: line.color.clone(),
                    size: line.size.clone(),
                    thumbnail: line.thumbnail.clone(),
                })
                .collect(),
            total_cents: order.total_amount().cents(),
            shipping_address: order.shipping_address().clone(),
            tracking_number: order.tracking_number().as_str().to_string(),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// GET /orders — every order, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.lifecycle.all().await;
    Ok(Json(orders.iter().map(OrderResponse::from_order).collect()))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.get(order_id).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

/// GET /users/:user_id/orders — a user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let orders = state.lifecycle.for_user(user_id).await;
    Ok(Json(orders.iter().map(OrderResponse::from_order).collect()))
}

/// PUT /orders/:id/status — move an order along the state machine.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.update_status(order_id, req.status).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

/// POST /users/:user_id/orders/:id/cancel — owner-initiated cancellation.
#[tracing::instrument(skip(state))]
pub async fn cancel<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<Json<OrderResponse>, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let order_id = parse_order_id(&id)?;
    let order = state.lifecycle.cancel_for_user(user_id, order_id).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}
