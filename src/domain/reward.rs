use serde::{Deserialize, Serialize};

use super::Coins;

/// A fixed (experience, coins) pair credited on a qualifying action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub experience: i64,
    pub coins: Coins,
}

impl Reward {
    pub const fn new(experience: i64, coins: Coins) -> Self {
        Self { experience, coins }
    }

    pub fn is_valid(&self) -> bool {
        self.experience >= 0 && self.coins >= 0
    }
}

/// Rewards paid out by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardPolicy {
    /// Credited to the uploader for every drawing
    pub upload: Reward,
    /// Credited to the drawing's owner for every like it receives
    pub like: Reward,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            upload: Reward::new(10, 10),
            like: Reward::new(1, 1),
        }
    }
}
