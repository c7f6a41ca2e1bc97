use thiserror::Error;

use super::STARTING_LEVEL;

/// How a user's level follows their experience.
///
/// Levels are staged, never derived on read: the stored level is updated
/// whenever experience is credited, and it never goes down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LevelPolicy {
    /// Level stays where it is
    #[default]
    Fixed,
    /// Strictly ascending experience thresholds; each one reached adds a level
    Thresholds(Vec<i64>),
}

impl LevelPolicy {
    /// Build a threshold policy, rejecting unsorted or non-positive values.
    pub fn thresholds(thresholds: Vec<i64>) -> Result<Self, LevelPolicyError> {
        if let Some(&bad) = thresholds.iter().find(|&&t| t <= 0) {
            return Err(LevelPolicyError::NonPositive(bad));
        }
        if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(LevelPolicyError::NotAscending);
        }
        Ok(Self::Thresholds(thresholds))
    }

    /// Parse a comma separated threshold list, e.g. "100,300,600".
    /// An empty string means `Fixed`.
    pub fn parse(input: &str) -> Result<Self, LevelPolicyError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Self::Fixed);
        }

        let thresholds = input
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|_| LevelPolicyError::InvalidNumber(part.trim().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::thresholds(thresholds)
    }

    /// Level for a user holding `experience`, currently at `current`.
    pub fn level_for(&self, experience: i64, current: i64) -> i64 {
        match self {
            LevelPolicy::Fixed => current,
            LevelPolicy::Thresholds(thresholds) => {
                let reached = thresholds.iter().filter(|&&t| experience >= t).count() as i64;
                current.max(STARTING_LEVEL + reached)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelPolicyError {
    #[error("invalid level threshold '{0}'")]
    InvalidNumber(String),

    #[error("level thresholds must be positive, got {0}")]
    NonPositive(i64),

    #[error("level thresholds must be strictly ascending")]
    NotAscending,
}
