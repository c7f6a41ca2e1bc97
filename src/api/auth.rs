//! Chat-platform authentication

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::application::AppError;
use crate::domain::{Identity, User};

use super::SharedState;

/// Auth request. The platform's signed `initData` is accepted but not verified.
#[derive(Debug, Deserialize)]
pub struct TelegramAuthRequest {
    pub user: Option<Identity>,
}

#[derive(Debug, Serialize)]
pub struct TelegramAuthResponse {
    pub success: bool,
    pub user: User,
    pub token: String,
}

/// POST /api/telegram-auth - Get or create the caller's user and issue a token
pub async fn telegram_auth(
    State(state): State<SharedState>,
    payload: Result<Json<TelegramAuthRequest>, JsonRejection>,
) -> Result<Json<TelegramAuthResponse>, AppError> {
    let Json(request) = payload?;
    let identity = request
        .user
        .ok_or_else(|| AppError::InvalidInput("missing platform user".to_string()))?;

    let session = state.ledger.authenticate(&identity).await?;

    Ok(Json(TelegramAuthResponse {
        success: true,
        token: session.token.to_string(),
        user: session.user,
    }))
}
