//! Shop handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::application::AppError;
use crate::domain::{Coins, ItemId, ShopItem};

use super::SharedState;

#[derive(Debug, Serialize)]
pub struct ShopItemsResponse {
    pub success: bool,
    pub items: Vec<ShopItem>,
}

#[derive(Debug, Deserialize)]
pub struct BuyRequest {
    pub token: Option<String>,
    pub item_id: Option<ItemId>,
}

#[derive(Debug, Serialize)]
pub struct BuyResponse {
    pub success: bool,
    pub message: String,
    pub new_balance: Coins,
}

/// GET /api/shop/items - The catalog, cheapest first
pub async fn list_items(
    State(state): State<SharedState>,
) -> Result<Json<ShopItemsResponse>, AppError> {
    let items = state.ledger.list_shop_items().await?;
    Ok(Json(ShopItemsResponse {
        success: true,
        items,
    }))
}

/// POST /api/shop/buy - Buy an item with coins
pub async fn buy_item(
    State(state): State<SharedState>,
    payload: Result<Json<BuyRequest>, JsonRejection>,
) -> Result<Json<BuyResponse>, AppError> {
    let Json(request) = payload?;
    let user = state.ledger.resolve_caller(request.token.as_deref()).await?;

    let item_id = request
        .item_id
        .ok_or_else(|| AppError::InvalidInput("missing item_id".to_string()))?;
    let result = state.ledger.purchase(user.id, item_id).await?;

    Ok(Json(BuyResponse {
        success: true,
        message: format!("Purchased {}!", result.item.name),
        new_balance: result.new_balance,
    }))
}
