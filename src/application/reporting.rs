use serde::Serialize;

use crate::domain::{Coins, Drawing, User};

/// Number of recent drawings shown on a profile.
pub const RECENT_DRAWINGS: i64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user: User,
    pub stats: ProfileStats,
    pub recent_drawings: Vec<RecentDrawing>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProfileStats {
    pub drawings_count: i64,
    /// Likes received across all of the user's drawings
    pub total_likes: i64,
    /// Distinct users who liked at least one of the user's drawings
    pub unique_likers: i64,
    pub level: i64,
    pub experience: i64,
    pub balance: Coins,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentDrawing {
    #[serde(flatten)]
    pub drawing: Drawing,
    pub image_url: String,
}

impl From<Drawing> for RecentDrawing {
    fn from(drawing: Drawing) -> Self {
        let image_url = drawing.image_url();
        Self { drawing, image_url }
    }
}
