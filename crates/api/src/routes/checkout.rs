//! Place-order endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{OrderResult, PlaceOrderRequest};

use crate::AppState;
use crate::error::ApiError;

/// POST /checkout/orders: runs the checkout saga for the user's cart.
#[tracing::instrument(skip_all, fields(user_id = %req.user_id))]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<OrderResult>, ApiError> {
    if req.user_id.as_str().trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    if req.user_currency.trim().is_empty() {
        return Err(ApiError::BadRequest("user_currency is required".to_string()));
    }

    let order = state.orchestrator.place_order(&req).await?;
    Ok(Json(order))
}
