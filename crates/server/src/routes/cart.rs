//! Cart route handlers.
//!
//! JSON in and out, camelCase field names. Every handler requires a bearer
//! token and acts on the caller's own cart.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::ProductId;

use super::{ApiJson, ApiPath};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CartItem, CartView, ItemUpdate};
use crate::state::AppState;

/// Body of add and update requests.
///
/// `quantity` is signed so that zero and negative values reach validation
/// and come back as a 400 with a useful message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Body returned when an update removed the line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedResponse {
    pub status: &'static str,
    pub product_id: ProductId,
}

/// Show the caller's cart.
#[instrument(skip(state, identity))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(state.carts().get_cart(&identity).await?))
}

/// Add a product to the cart.
#[instrument(skip(state, identity))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Json<CartItem>> {
    let item = state
        .carts()
        .add_item(&identity, body.product_id, body.quantity)
        .await?;
    Ok(Json(item))
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(state, identity))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Response> {
    let outcome = state
        .carts()
        .update_item_quantity(&identity, body.product_id, body.quantity)
        .await?;

    Ok(match outcome {
        ItemUpdate::Updated(item) => Json(item).into_response(),
        ItemUpdate::Removed => Json(RemovedResponse {
            status: "removed",
            product_id: body.product_id,
        })
        .into_response(),
    })
}

/// Remove a line from the cart.
#[instrument(skip(state, identity))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<StatusCode> {
    state.carts().remove_item(&identity, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every line from the cart.
#[instrument(skip(state, identity))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<StatusCode> {
    state.carts().clear_cart(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
