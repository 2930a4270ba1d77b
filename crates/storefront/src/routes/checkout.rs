//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::checkout::{CheckoutRequest, OrderConfirmation};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Place an order for the current cart.
///
/// Runs detached from the request: once payment starts, the ordered lines are
/// removed even if the client goes away.
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    add_breadcrumb("checkout", "Place order", &[]);

    let checkout = state.checkout().clone();
    let confirmation = tokio::spawn(async move { checkout.place_order(&request).await })
        .await
        .map_err(|e| AppError::Internal(format!("checkout task failed: {e}")))??;

    Ok((StatusCode::CREATED, Json(confirmation)))
}
