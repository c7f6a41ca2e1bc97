use std::fmt;

use super::TelegramId;

const TOKEN_PREFIX: &str = "user_";

/// Caller token handed out by telegram auth and sent back in POST bodies.
///
/// Format: `user_<telegram_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerToken(TelegramId);

impl CallerToken {
    pub fn for_user(telegram_id: TelegramId) -> Self {
        Self(telegram_id)
    }

    /// Parse a token; `None` for anything that isn't `user_<integer>`.
    pub fn parse(token: &str) -> Option<Self> {
        token
            .trim()
            .strip_prefix(TOKEN_PREFIX)?
            .parse::<TelegramId>()
            .ok()
            .map(Self)
    }

    pub fn telegram_id(&self) -> TelegramId {
        self.0
    }
}

impl fmt::Display for CallerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TOKEN_PREFIX, self.0)
    }
}
