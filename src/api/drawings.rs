//! Gallery, upload and like handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::application::{AppError, UploadResult};
use crate::domain::{DrawingId, DrawingView, NewDrawing, Reward, UserId};

use super::{AppState, SharedState};

#[derive(Debug, Serialize)]
pub struct DrawingsListResponse {
    pub success: bool,
    pub drawings: Vec<DrawingView>,
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub token: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Base64 image, optionally as a data URL
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub drawing_id: DrawingId,
    pub image_url: String,
    pub reward: Reward,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub success: bool,
    pub message: String,
    pub like_count: i64,
    pub reward: Reward,
}

/// GET /api/drawings - Newest drawings with their authors
pub async fn list_drawings(
    State(state): State<SharedState>,
) -> Result<Json<DrawingsListResponse>, AppError> {
    let drawings = state.ledger.list_drawings().await?;
    Ok(Json(DrawingsListResponse {
        success: true,
        drawings,
    }))
}

/// POST /api/drawings/upload - Store an image and credit the uploader
pub async fn upload_drawing(
    State(state): State<SharedState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let Json(request) = payload?;
    let user = state.ledger.resolve_caller(request.token.as_deref()).await?;

    let result = save_drawing(&state, user.id, request).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Drawing saved! +{} XP, +{} coins",
            result.reward.experience, result.reward.coins
        ),
        drawing_id: result.drawing.id,
        image_url: result.drawing.image_url(),
        reward: result.reward,
    }))
}

/// Store the image, then record the drawing. The image file is removed if
/// the drawing cannot be recorded.
pub async fn save_drawing(
    state: &AppState,
    owner: UserId,
    request: UploadRequest,
) -> Result<UploadResult, AppError> {
    let image = request
        .image
        .as_deref()
        .ok_or_else(|| AppError::InvalidInput("no image".to_string()))?;
    let filename = state.images.save(owner, image).await?;

    let drawing = NewDrawing::new(owner, filename.clone())
        .with_title(request.title)
        .with_description(request.description);

    match state.ledger.record_upload(drawing).await {
        Ok(result) => Ok(result),
        Err(e) => {
            state.images.remove(&filename).await;
            Err(e)
        }
    }
}

/// POST /api/drawings/:id/like - Like a drawing, rewarding its owner
pub async fn like_drawing(
    State(state): State<SharedState>,
    Path(drawing_id): Path<DrawingId>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> Result<Json<LikeResponse>, AppError> {
    let Json(request) = payload?;
    let user = state.ledger.resolve_caller(request.token.as_deref()).await?;

    let result = state.ledger.record_like(user.id, drawing_id).await?;

    Ok(Json(LikeResponse {
        success: true,
        message: "Like recorded".to_string(),
        like_count: result.like_count,
        reward: result.reward,
    }))
}
