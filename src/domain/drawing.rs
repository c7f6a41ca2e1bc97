use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

pub type DrawingId = i64;

/// Title used when an upload doesn't carry one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Public path prefix uploaded images are addressed under.
pub const IMAGE_URL_PREFIX: &str = "/static/drawings";

/// Build the public URL for a stored image filename.
pub fn image_url(filename: &str) -> String {
    format!("{}/{}", IMAGE_URL_PREFIX, filename)
}

/// An uploaded drawing. Only `like_count` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: DrawingId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub filename: String,
    /// Denormalized count of like facts for this drawing
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Drawing {
    pub fn image_url(&self) -> String {
        image_url(&self.filename)
    }
}

/// A drawing that hasn't been stored yet. The id is assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrawing {
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub filename: String,
}

impl NewDrawing {
    pub fn new(user_id: UserId, filename: impl Into<String>) -> Self {
        Self {
            user_id,
            title: DEFAULT_TITLE.to_string(),
            description: String::new(),
            filename: filename.into(),
        }
    }

    /// Set the title; blank titles keep the default.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        if let Some(title) = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            self.title = title;
        }
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.unwrap_or_default();
        self
    }
}

/// Gallery entry: a drawing joined with its author.
#[derive(Debug, Clone, Serialize)]
pub struct DrawingView {
    #[serde(flatten)]
    pub drawing: Drawing,
    pub author_name: String,
    pub image_url: String,
}

impl DrawingView {
    pub fn new(drawing: Drawing, author_name: String) -> Self {
        let image_url = drawing.image_url();
        Self {
            drawing,
            author_name,
            image_url,
        }
    }
}
