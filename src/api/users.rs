//! Profile handlers

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;

use crate::application::{AppError, UserProfile};
use crate::domain::{Purchase, UserId};

use super::SharedState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(flatten)]
    pub profile: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct PurchasesResponse {
    pub success: bool,
    pub items: Vec<Purchase>,
}

/// GET /api/users/:id - Profile with stats and recent drawings
pub async fn get_user_profile(
    State(state): State<SharedState>,
    Path(id): Path<UserId>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.ledger.user_profile(id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

/// GET /api/users/:id/purchases - Items the user owns
pub async fn list_user_purchases(
    State(state): State<SharedState>,
    Path(id): Path<UserId>,
) -> Result<Json<PurchasesResponse>, AppError> {
    let items = state.ledger.list_purchases(id).await?;
    Ok(Json(PurchasesResponse {
        success: true,
        items,
    }))
}
