use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-generated user key.
pub type UserId = i64;

/// External chat-platform id, the identity key users authenticate with.
pub type TelegramId = i64;

/// Coins are whole units; there is no fractional currency.
pub type Coins = i64;

/// Level every new user starts at.
pub const STARTING_LEVEL: i64 = 1;

/// Identity fields sent by the chat platform on first contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: TelegramId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Identity {
    pub fn new(id: TelegramId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: Option<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = last;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub balance: Coins,
    pub experience: i64,
    pub level: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown next to a user's drawings: "First Last (@username)".
    pub fn display_name(&self) -> String {
        author_name(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.username.as_deref(),
        )
    }
}

/// Build an author label from optional name parts.
/// Falls back to the bare username, then to "Anonymous".
pub fn author_name(first: Option<&str>, last: Option<&str>, username: Option<&str>) -> String {
    let full = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match (full.is_empty(), username.filter(|u| !u.is_empty())) {
        (false, Some(username)) => format!("{} (@{})", full, username),
        (false, None) => full,
        (true, Some(username)) => format!("@{}", username),
        (true, None) => "Anonymous".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_name_full() {
        assert_eq!(
            author_name(Some("Anna"), Some("Khudozhnikova"), Some("art_lover")),
            "Anna Khudozhnikova (@art_lover)"
        );
    }

    #[test]
    fn test_author_name_without_last_name() {
        assert_eq!(author_name(Some("Olga"), None, None), "Olga");
        assert_eq!(author_name(Some("Olga"), Some("  "), None), "Olga");
    }

    #[test]
    fn test_author_name_fallbacks() {
        assert_eq!(author_name(None, None, Some("creative_soul")), "@creative_soul");
        assert_eq!(author_name(None, None, None), "Anonymous");
        assert_eq!(author_name(Some(""), None, Some("")), "Anonymous");
    }

    #[test]
    fn test_identity_builder() {
        let identity = Identity::new(42)
            .with_username("max")
            .with_name("Maksim", Some("Tvorets".into()));
        assert_eq!(identity.id, 42);
        assert_eq!(identity.username.as_deref(), Some("max"));
        assert_eq!(identity.first_name.as_deref(), Some("Maksim"));
        assert_eq!(identity.last_name.as_deref(), Some("Tvorets"));
    }
}
