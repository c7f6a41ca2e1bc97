use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::domain::{
    build_integrity_report, CallerToken, Coins, Drawing, DrawingId, DrawingView, Identity,
    IntegrityReport, ItemId, LikeOutcome, NewDrawing, Purchase, PurchaseOutcome, Reward,
    ShopItem, Stats, User, UserId,
};
use crate::storage::Repository;

use super::{AppError, ProfileStats, RecentDrawing, UserProfile, RECENT_DRAWINGS};

/// Most drawings returned by the gallery listing.
pub const GALLERY_LIMIT: i64 = 100;

/// Application service owning balances, experience and ownership facts.
/// This is the primary interface for any client (HTTP API, CLI).
#[derive(Clone)]
pub struct LedgerService {
    repo: Repository,
    config: LedgerConfig,
}

/// Result of authenticating through the chat platform
#[derive(Debug)]
pub struct AuthSession {
    pub user: User,
    pub token: CallerToken,
    pub created: bool,
}

/// Result of uploading a drawing
#[derive(Debug)]
pub struct UploadResult {
    pub drawing: Drawing,
    pub reward: Reward,
}

/// Result of liking a drawing
#[derive(Debug)]
pub struct LikeResult {
    /// Credited to the drawing's owner, not the liker
    pub reward: Reward,
    pub owner_id: UserId,
    pub like_count: i64,
}

/// Result of buying a shop item
#[derive(Debug)]
pub struct PurchaseResult {
    pub item: ShopItem,
    pub new_balance: Coins,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository, config: LedgerConfig) -> Self {
        Self { repo, config }
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str, config: LedgerConfig) -> Result<Self, AppError> {
        let repo = Repository::init(database_path).await?;
        Ok(Self::new(repo, config))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: LedgerConfig) -> Result<Self, AppError> {
        let repo = Repository::connect(database_path, false).await?;
        Ok(Self::new(repo, config))
    }

    // ========================
    // Users
    // ========================

    /// Get or create the user behind a chat-platform identity and issue a token.
    pub async fn authenticate(&self, identity: &Identity) -> Result<AuthSession, AppError> {
        if identity.id <= 0 {
            return Err(AppError::InvalidInput("invalid platform user id".to_string()));
        }

        let (user, created) = self
            .repo
            .get_or_create_user(identity, self.config.starting_balance)
            .await?;
        if created {
            info!(user_id = user.id, telegram_id = user.telegram_id, "New user");
        }

        Ok(AuthSession {
            token: CallerToken::for_user(user.telegram_id),
            user,
            created,
        })
    }

    /// Resolve the user behind a caller token.
    pub async fn resolve_caller(&self, token: Option<&str>) -> Result<User, AppError> {
        let token = token
            .and_then(CallerToken::parse)
            .ok_or(AppError::Unauthenticated)?;

        self.repo
            .get_user_by_telegram_id(token.telegram_id())
            .await?
            .ok_or_else(|| AppError::UserNotFound(token.to_string()))
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Profile: the user, their stats and most recent drawings.
    pub async fn user_profile(&self, id: UserId) -> Result<UserProfile, AppError> {
        let user = self.get_user(id).await?;
        let drawing_stats = self.repo.drawing_stats(id).await?;
        let recent_drawings = self
            .repo
            .list_user_drawings(id, RECENT_DRAWINGS)
            .await?
            .into_iter()
            .map(RecentDrawing::from)
            .collect();

        Ok(UserProfile {
            stats: ProfileStats {
                drawings_count: drawing_stats.drawings_count,
                total_likes: drawing_stats.total_likes,
                unique_likers: drawing_stats.unique_likers,
                level: user.level,
                experience: user.experience,
                balance: user.balance,
            },
            user,
            recent_drawings,
        })
    }

    // ========================
    // Drawings and likes
    // ========================

    /// Store an uploaded drawing and credit the upload reward to its owner.
    pub async fn record_upload(&self, drawing: NewDrawing) -> Result<UploadResult, AppError> {
        let reward = self.config.rewards.upload;

        let drawing = self
            .repo
            .create_drawing(&drawing, reward, &self.config.levels)
            .await?
            .ok_or_else(|| AppError::UserNotFound(drawing.user_id.to_string()))?;

        info!(
            drawing_id = drawing.id,
            user_id = drawing.user_id,
            xp = reward.experience,
            coins = reward.coins,
            "Drawing uploaded"
        );
        Ok(UploadResult { drawing, reward })
    }

    /// Get a drawing by ID.
    pub async fn get_drawing(&self, id: DrawingId) -> Result<Drawing, AppError> {
        self.repo
            .get_drawing(id)
            .await?
            .ok_or(AppError::DrawingNotFound(id))
    }

    /// Newest drawings first, with author names.
    pub async fn list_drawings(&self) -> Result<Vec<DrawingView>, AppError> {
        Ok(self.repo.list_drawings(GALLERY_LIMIT).await?)
    }

    /// Like a drawing. Exactly one like per (user, drawing) ever succeeds;
    /// the reward goes to the drawing's owner.
    pub async fn record_like(
        &self,
        user_id: UserId,
        drawing_id: DrawingId,
    ) -> Result<LikeResult, AppError> {
        let reward = self.config.rewards.like;

        match self
            .repo
            .record_like(user_id, drawing_id, reward, &self.config.levels)
            .await?
        {
            LikeOutcome::Recorded {
                owner_id,
                like_count,
            } => {
                info!(user_id, drawing_id, owner_id, like_count, "Drawing liked");
                Ok(LikeResult {
                    reward,
                    owner_id,
                    like_count,
                })
            }
            LikeOutcome::AlreadyLiked => {
                debug!(user_id, drawing_id, "Like rejected: already liked");
                Err(AppError::AlreadyLiked {
                    user_id,
                    drawing_id,
                })
            }
            LikeOutcome::DrawingMissing => Err(AppError::DrawingNotFound(drawing_id)),
        }
    }

    // ========================
    // Shop
    // ========================

    /// List the catalog, cheapest first.
    pub async fn list_shop_items(&self) -> Result<Vec<ShopItem>, AppError> {
        Ok(self.repo.list_shop_items().await?)
    }

    /// Buy an item. Fails on repurchase or insufficient balance; on success
    /// the debit and the ownership fact are committed together.
    pub async fn purchase(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<PurchaseResult, AppError> {
        let item = self
            .repo
            .get_shop_item(item_id)
            .await?
            .ok_or(AppError::ItemNotFound(item_id))?;

        match self.repo.purchase_item(user_id, &item).await? {
            PurchaseOutcome::Purchased { new_balance } => {
                info!(user_id, item_id, price = item.price, new_balance, "Item purchased");
                Ok(PurchaseResult { item, new_balance })
            }
            PurchaseOutcome::AlreadyOwned => {
                debug!(user_id, item_id, "Purchase rejected: already owned");
                Err(AppError::AlreadyOwned { user_id, item_id })
            }
            PurchaseOutcome::InsufficientFunds { balance } => {
                debug!(user_id, item_id, balance, "Purchase rejected: insufficient funds");
                Err(AppError::InsufficientFunds {
                    balance,
                    required: item.price,
                })
            }
        }
    }

    /// Items owned by a user.
    pub async fn list_purchases(&self, user_id: UserId) -> Result<Vec<Purchase>, AppError> {
        self.get_user(user_id).await?;
        Ok(self.repo.list_purchases(user_id).await?)
    }

    // ========================
    // Statistics and integrity
    // ========================

    pub async fn stats(&self) -> Result<Stats, AppError> {
        Ok(self.repo.stats().await?)
    }

    /// Check the ledger invariants against the store and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_integrity_stats().await?;
        Ok(build_integrity_report(&stats))
    }
}
