use thiserror::Error;

use crate::domain::{Coins, DrawingId, ItemId, UserId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated: missing or invalid token")]
    Unauthenticated,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Drawing not found: {0}")]
    DrawingNotFound(DrawingId),

    #[error("Shop item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("User {user_id} already liked drawing {drawing_id}")]
    AlreadyLiked { user_id: UserId, drawing_id: DrawingId },

    #[error("User {user_id} already owns item {item_id}")]
    AlreadyOwned { user_id: UserId, item_id: ItemId },

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Coins, required: Coins },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
