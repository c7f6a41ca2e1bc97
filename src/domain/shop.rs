use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Coins, UserId};

pub type ItemId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Brush,
    Frame,
    Background,
    Filter,
    /// Several items sold together
    Bundle,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Brush => "brush",
            ItemKind::Frame => "frame",
            ItemKind::Background => "background",
            ItemKind::Filter => "filter",
            ItemKind::Bundle => "bundle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "brush" => Some(ItemKind::Brush),
            "frame" => Some(ItemKind::Frame),
            "background" => Some(ItemKind::Background),
            "filter" => Some(ItemKind::Filter),
            "bundle" => Some(ItemKind::Bundle),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static catalog entry with a fixed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub price: Coins,
    pub kind: ItemKind,
    pub icon: String,
}

/// Catalog row before it gets an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub price: Coins,
    pub kind: ItemKind,
    pub icon: &'static str,
}

/// Items seeded into an empty shop.
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            name: "Watercolor Brush",
            description: "Realistic watercolor brush",
            price: 100,
            kind: ItemKind::Brush,
            icon: "🖌️",
        },
        CatalogEntry {
            name: "Oil Brush",
            description: "Textured oil paint brush",
            price: 150,
            kind: ItemKind::Brush,
            icon: "🎨",
        },
        CatalogEntry {
            name: "Golden Frame",
            description: "An elegant frame for your work",
            price: 200,
            kind: ItemKind::Frame,
            icon: "🖼️",
        },
        CatalogEntry {
            name: "Space Background",
            description: "Cosmic background for drawings",
            price: 300,
            kind: ItemKind::Background,
            icon: "🌌",
        },
        CatalogEntry {
            name: "Anime Style",
            description: "Anime stylization filter",
            price: 250,
            kind: ItemKind::Filter,
            icon: "🌸",
        },
        CatalogEntry {
            name: "Professional Set",
            description: "10 premium brushes and 5 backgrounds",
            price: 1000,
            kind: ItemKind::Bundle,
            icon: "🎁",
        },
    ]
}

/// Ownership fact: a user bought an item. At most one per (user, item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub user_id: UserId,
    pub item: ShopItem,
    /// Price paid at the time of purchase
    pub price: Coins,
    pub purchased_at: DateTime<Utc>,
}
