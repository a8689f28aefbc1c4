//! Payment initiation and gateway callback verification.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use checkout::{PaymentGateway, PaymentInitiation, PaymentOutcome};
use domain::{Money, Payment, PaymentMethod, PaymentStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::{AppState, parse_order_id};

#[derive(Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
}

#[derive(Deserialize)]
pub struct VerifyParams {
    /// Order ID the gateway calls back with.
    pub oid: String,
    /// Gateway-issued reference for the transaction.
    pub ref_id: String,
    /// Claimed amount as a decimal string, e.g. `"20.00"`.
    pub amt: String,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub order_id: String,
    pub transaction_id: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount_cents: i64,
    pub gateway_ref: Option<String>,
    pub failure_reason: Option<String>,
}

impl PaymentResponse {
    fn from_payment(payment: &Payment) -> Self {
        Self {
            order_id: payment.order_id().to_string(),
            transaction_id: payment.transaction_id().to_string(),
            method: payment.method(),
            status: payment.status(),
            amount_cents: payment.amount().cents(),
            gateway_ref: payment.gateway_ref().map(String::from),
            failure_reason: payment.failure_reason().map(String::from),
        }
    }
}

/// POST /payments — initiate payment for an order.
///
/// Responds `200 OK` with the transaction ID and, for gateway payments,
/// the redirect URL.
#[tracing::instrument(skip(state, req))]
pub async fn initiate<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<Json<PaymentInitiation>, ApiError> {
    let order_id = parse_order_id(&req.order_id)?;
    let initiation = state
        .payments
        .initiate(order_id, req.method, Money::from_cents(req.amount_cents))
        .await?;
    Ok(Json(initiation))
}

/// GET /payments/verify — confirm a gateway callback server-to-server.
///
/// A failed verification is reported in the body with `200 OK`; only
/// malformed input or gateway transport faults produce error statuses.
#[tracing::instrument(skip(state, params))]
pub async fn verify<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<PaymentOutcome>, ApiError> {
    let order_id = parse_order_id(&params.oid)?;
    let amount = parse_amount(&params.amt)?;
    let outcome = state
        .payments
        .verify(order_id, params.ref_id, amount)
        .await?;
    Ok(Json(outcome))
}

/// GET /payments/:order_id — the payment record for an order.
#[tracing::instrument(skip(state))]
pub async fn get<G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<G>>>,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let order_id = parse_order_id(&order_id)?;
    let payment = state.payments.get(order_id).await?;
    Ok(Json(PaymentResponse::from_payment(&payment)))
}

/// Parses a decimal amount string (`"20"`, `"20.5"`, `"20.50"`) to cents.
fn parse_amount(s: &str) -> Result<Money, ApiError> {
    let invalid = || ApiError::BadRequest(format!("Invalid amount: {s}"));
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    if whole < 0 {
        return Err(invalid());
    }
    let cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        2 => frac.parse::<i64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    if cents < 0 {
        return Err(invalid());
    }
    Ok(Money::from_cents(whole * 100 + cents))
}
