//! Application configuration
//!
//! Centralized configuration with environment variable support and
//! sensible defaults. Command-line flags override the server and storage
//! settings loaded here.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::domain::{Coins, LevelPolicy, Reward, RewardPolicy};

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database and upload locations
    pub storage: StorageConfig,
    /// Rewards, starting balance and level staging
    pub ledger: LedgerConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: String,
    /// Directory uploaded images are written to
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "drawfy.db".to_string(),
            upload_dir: PathBuf::from("static/drawings"),
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Coins a user holds right after first contact
    pub starting_balance: Coins,
    pub rewards: RewardPolicy,
    pub levels: LevelPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 100,
            rewards: RewardPolicy::default(),
            levels: LevelPolicy::Fixed,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server = ServerConfig {
            host: lookup("HOST").unwrap_or(defaults.server.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.server.port),
            max_upload_bytes: parse_var(&lookup, "DRAWFY_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.server.max_upload_bytes),
        };

        let storage = StorageConfig {
            database_path: lookup("DRAWFY_DATABASE").unwrap_or(defaults.storage.database_path),
            upload_dir: lookup("DRAWFY_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage.upload_dir),
        };

        let reward = |xp_key: &str, coins_key: &str, default: Reward| {
            let reward = Reward::new(
                parse_var(&lookup, xp_key).unwrap_or(default.experience),
                parse_var(&lookup, coins_key).unwrap_or(default.coins),
            );
            if reward.is_valid() {
                reward
            } else {
                warn!(?reward, "Negative reward configured, using default");
                default
            }
        };

        let levels = match lookup("DRAWFY_LEVEL_THRESHOLDS") {
            Some(raw) => LevelPolicy::parse(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring DRAWFY_LEVEL_THRESHOLDS");
                LevelPolicy::Fixed
            }),
            None => defaults.ledger.levels,
        };

        let starting_balance = parse_var(&lookup, "DRAWFY_STARTING_BALANCE")
            .filter(|balance: &Coins| *balance >= 0)
            .unwrap_or(defaults.ledger.starting_balance);

        let ledger = LedgerConfig {
            starting_balance,
            rewards: RewardPolicy {
                upload: reward(
                    "DRAWFY_UPLOAD_XP",
                    "DRAWFY_UPLOAD_COINS",
                    defaults.ledger.rewards.upload,
                ),
                like: reward(
                    "DRAWFY_LIKE_XP",
                    "DRAWFY_LIKE_COINS",
                    defaults.ledger.rewards.like,
                ),
            },
            levels,
        };

        Self {
            server,
            storage,
            ledger,
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}
