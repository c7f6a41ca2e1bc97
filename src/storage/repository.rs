use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::domain::{
    author_name, default_catalog, Coins, CounterMismatch, Drawing, DrawingId, DrawingView,
    Identity, IntegrityStats, ItemId, ItemKind, LevelPolicy, LikeOutcome, NewDrawing, Purchase,
    PurchaseOutcome, Reward, ShopItem, Stats, TelegramId, User, UserId, STARTING_LEVEL,
};

use super::MIGRATION_001_INITIAL;

const USER_COLUMNS: &str =
    "id, telegram_id, username, first_name, last_name, balance, experience, level, created_at";

const DRAWING_COLUMNS: &str = "id, user_id, title, description, filename, like_count, created_at";

const MAX_CONNECTIONS: u32 = 5;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-user figures shown on a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawingStats {
    pub drawings_count: i64,
    pub total_likes: i64,
    pub unique_likers: i64,
}

/// Repository for persisting users, drawings and the like/purchase facts.
///
/// Every operation that moves coins or experience runs in a single
/// transaction whose first statement is a write, so concurrent callers
/// queue on SQLite's write lock instead of racing on stale reads.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database file.
    /// With `create` set, the file is created if it doesn't exist.
    pub async fn connect(database_path: &str, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", database_path))
            .context("Invalid database path")?
            .create_if_missing(create)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!(path = %database_path, "Connected to SQLite database");
        Ok(Self::new(pool))
    }

    /// Run database migrations and seed the shop catalog if it is empty.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        self.seed_catalog().await?;
        debug!("Database migrations completed");
        Ok(())
    }

    /// Initialize a database (connect, creating the file if needed, + migrate).
    pub async fn init(database_path: &str) -> Result<Self> {
        let repo = Self::connect(database_path, true).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    async fn seed_catalog(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin seed")?;

        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM shop_items")
            .fetch_one(&mut *tx)
            .await
            .context("Failed to count shop items")?
            .get("count");

        if count > 0 {
            return Ok(());
        }

        for entry in default_catalog() {
            sqlx::query(
                "INSERT INTO shop_items (name, description, price, kind, icon) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(entry.name)
            .bind(entry.description)
            .bind(entry.price)
            .bind(entry.kind.as_str())
            .bind(entry.icon)
            .execute(&mut *tx)
            .await
            .context("Failed to seed shop item")?;
        }

        tx.commit().await.context("Failed to commit catalog seed")?;
        info!("Seeded shop catalog");
        Ok(())
    }

    // ========================
    // User operations
    // ========================

    /// Get the user for an identity, creating it on first contact.
    /// Returns the user and whether it was just created.
    pub async fn get_or_create_user(
        &self,
        identity: &Identity,
        starting_balance: Coins,
    ) -> Result<(User, bool)> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, balance, experience, level, created_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT (telegram_id) DO NOTHING
            "#,
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(starting_balance)
        .bind(STARTING_LEVEL)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .context("Failed to create user")?
        .rows_affected();

        let user = self
            .get_user_by_telegram_id(identity.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {} vanished after insert", identity.id))?;

        Ok((user, inserted > 0))
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by external platform id.
    pub async fn get_user_by_telegram_id(&self, telegram_id: TelegramId) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE telegram_id = ?",
            USER_COLUMNS
        ))
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by telegram id")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Credit a reward and stage the level. Returns false if the user doesn't exist.
    async fn credit_user(
        conn: &mut SqliteConnection,
        user_id: UserId,
        reward: Reward,
        levels: &LevelPolicy,
    ) -> Result<bool> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET experience = experience + ?, balance = balance + ?
            WHERE id = ?
            RETURNING experience, level
            "#,
        )
        .bind(reward.experience)
        .bind(reward.coins)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to credit reward")?;

        let Some(row) = row else {
            return Ok(false);
        };

        let experience: i64 = row.get("experience");
        let level: i64 = row.get("level");
        let staged = levels.level_for(experience, level);

        if staged != level {
            sqlx::query("UPDATE users SET level = ? WHERE id = ?")
                .bind(staged)
                .bind(user_id)
                .execute(&mut *conn)
                .await
                .context("Failed to update level")?;
            debug!(user_id, from = level, to = staged, "Level up");
        }

        Ok(true)
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let created_at: String = row.get("created_at");

        Ok(User {
            id: row.get("id"),
            telegram_id: row.get("telegram_id"),
            username: row.get("username"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            balance: row.get("balance"),
            experience: row.get("experience"),
            level: row.get("level"),
            created_at: parse_timestamp(&created_at).context("Invalid user created_at")?,
        })
    }

    // ========================
    // Drawing operations
    // ========================

    /// Store a drawing and credit the upload reward to its owner, atomically.
    /// Returns `None` if the owner doesn't exist.
    pub async fn create_drawing(
        &self,
        drawing: &NewDrawing,
        reward: Reward,
        levels: &LevelPolicy,
    ) -> Result<Option<Drawing>> {
        let mut tx = self.pool.begin().await.context("Failed to begin upload")?;

        if !Self::credit_user(&mut tx, drawing.user_id, reward, levels).await? {
            tx.rollback().await.context("Failed to roll back upload")?;
            return Ok(None);
        }

        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO drawings (user_id, title, description, filename, like_count, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(drawing.user_id)
        .bind(&drawing.title)
        .bind(&drawing.description)
        .bind(&drawing.filename)
        .bind(timestamp(created_at))
        .fetch_one(&mut *tx)
        .await
        .context("Failed to save drawing")?;

        tx.commit().await.context("Failed to commit upload")?;

        Ok(Some(Drawing {
            id: row.get("id"),
            user_id: drawing.user_id,
            title: drawing.title.clone(),
            description: drawing.description.clone(),
            filename: drawing.filename.clone(),
            like_count: 0,
            created_at,
        }))
    }

    /// Get a drawing by ID.
    pub async fn get_drawing(&self, id: DrawingId) -> Result<Option<Drawing>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM drawings WHERE id = ?",
            DRAWING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch drawing")?;

        row.as_ref().map(Self::row_to_drawing).transpose()
    }

    /// List the newest drawings with their authors.
    pub async fn list_drawings(&self, limit: i64) -> Result<Vec<DrawingView>> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.user_id, d.title, d.description, d.filename, d.like_count, d.created_at,
                   u.username, u.first_name, u.last_name
            FROM drawings d
            JOIN users u ON d.user_id = u.id
            ORDER BY d.id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list drawings")?;

        rows.iter()
            .map(|row| {
                let drawing = Self::row_to_drawing(row)?;
                let first: Option<String> = row.get("first_name");
                let last: Option<String> = row.get("last_name");
                let username: Option<String> = row.get("username");
                let author = author_name(first.as_deref(), last.as_deref(), username.as_deref());
                Ok(DrawingView::new(drawing, author))
            })
            .collect()
    }

    /// List a user's drawings, newest first.
    pub async fn list_user_drawings(&self, user_id: UserId, limit: i64) -> Result<Vec<Drawing>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM drawings WHERE user_id = ? ORDER BY id DESC LIMIT ?",
            DRAWING_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list user drawings")?;

        rows.iter().map(Self::row_to_drawing).collect()
    }

    /// Drawing count, likes received and distinct likers for a user.
    pub async fn drawing_stats(&self, user_id: UserId) -> Result<DrawingStats> {
        let totals = sqlx::query(
            r#"
            SELECT COUNT(*) AS drawings_count, COALESCE(SUM(like_count), 0) AS total_likes
            FROM drawings
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count user drawings")?;

        let unique_likers: i64 = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT l.user_id) AS unique_likers
            FROM likes l
            JOIN drawings d ON l.drawing_id = d.id
            WHERE d.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count unique likers")?
        .get("unique_likers");

        Ok(DrawingStats {
            drawings_count: totals.get("drawings_count"),
            total_likes: totals.get("total_likes"),
            unique_likers,
        })
    }

    fn row_to_drawing(row: &SqliteRow) -> Result<Drawing> {
        let created_at: String = row.get("created_at");

        Ok(Drawing {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            description: row.get("description"),
            filename: row.get("filename"),
            like_count: row.get("like_count"),
            created_at: parse_timestamp(&created_at).context("Invalid drawing created_at")?,
        })
    }

    // ========================
    // Like operations
    // ========================

    /// Record a like fact, bump the drawing's counter and credit its owner.
    ///
    /// The counter update goes first so the transaction holds the write lock
    /// before the conditional insert; a conflicting insert rolls everything back.
    pub async fn record_like(
        &self,
        user_id: UserId,
        drawing_id: DrawingId,
        reward: Reward,
        levels: &LevelPolicy,
    ) -> Result<LikeOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to begin like")?;

        let row = sqlx::query(
            r#"
            UPDATE drawings
            SET like_count = like_count + 1
            WHERE id = ?
            RETURNING user_id, like_count
            "#,
        )
        .bind(drawing_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to update like counter")?;

        let Some(row) = row else {
            tx.rollback().await.context("Failed to roll back like")?;
            return Ok(LikeOutcome::DrawingMissing);
        };
        let owner_id: UserId = row.get("user_id");
        let like_count: i64 = row.get("like_count");

        let inserted = sqlx::query(
            r#"
            INSERT INTO likes (user_id, drawing_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, drawing_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(drawing_id)
        .bind(timestamp(Utc::now()))
        .execute(&mut *tx)
        .await
        .context("Failed to save like")?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await.context("Failed to roll back like")?;
            return Ok(LikeOutcome::AlreadyLiked);
        }

        if !Self::credit_user(&mut tx, owner_id, reward, levels).await? {
            anyhow::bail!("Owner {} of drawing {} does not exist", owner_id, drawing_id);
        }

        tx.commit().await.context("Failed to commit like")?;
        Ok(LikeOutcome::Recorded {
            owner_id,
            like_count,
        })
    }

    // ========================
    // Shop operations
    // ========================

    /// List the catalog, cheapest first.
    pub async fn list_shop_items(&self) -> Result<Vec<ShopItem>> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, kind, icon FROM shop_items ORDER BY price, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list shop items")?;

        rows.iter().map(Self::row_to_item).collect()
    }

    /// Get a shop item by ID.
    pub async fn get_shop_item(&self, id: ItemId) -> Result<Option<ShopItem>> {
        let row = sqlx::query(
            "SELECT id, name, description, price, kind, icon FROM shop_items WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch shop item")?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    /// Record a purchase fact and debit the price, atomically.
    ///
    /// Ownership is decided before funds: the conditional insert runs first,
    /// then the guarded debit. If either step refuses, nothing persists.
    pub async fn purchase_item(&self, user_id: UserId, item: &ShopItem) -> Result<PurchaseOutcome> {
        let mut tx = self.pool.begin().await.context("Failed to begin purchase")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO purchases (user_id, item_id, price, purchased_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id, item_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(item.id)
        .bind(item.price)
        .bind(timestamp(Utc::now()))
        .execute(&mut *tx)
        .await
        .context("Failed to save purchase")?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await.context("Failed to roll back purchase")?;
            return Ok(PurchaseOutcome::AlreadyOwned);
        }

        let debited = sqlx::query(
            r#"
            UPDATE users
            SET balance = balance - ?
            WHERE id = ? AND balance >= ?
            RETURNING balance
            "#,
        )
        .bind(item.price)
        .bind(user_id)
        .bind(item.price)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to debit balance")?;

        if let Some(row) = debited {
            let new_balance: Coins = row.get("balance");
            tx.commit().await.context("Failed to commit purchase")?;
            return Ok(PurchaseOutcome::Purchased { new_balance });
        }

        let balance: Option<Coins> = sqlx::query("SELECT balance FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read balance")?
            .map(|row| row.get("balance"));
        tx.rollback().await.context("Failed to roll back purchase")?;

        match balance {
            Some(balance) => Ok(PurchaseOutcome::InsufficientFunds { balance }),
            None => anyhow::bail!("User {} does not exist", user_id),
        }
    }

    /// List everything a user owns, in purchase order.
    pub async fn list_purchases(&self, user_id: UserId) -> Result<Vec<Purchase>> {
        let rows = sqlx::query(
            r#"
            SELECT p.user_id, p.price AS paid, p.purchased_at,
                   s.id, s.name, s.description, s.price, s.kind, s.icon
            FROM purchases p
            JOIN shop_items s ON p.item_id = s.id
            WHERE p.user_id = ?
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list purchases")?;

        rows.iter()
            .map(|row| {
                let purchased_at: String = row.get("purchased_at");
                Ok(Purchase {
                    user_id: row.get("user_id"),
                    item: Self::row_to_item(row)?,
                    price: row.get("paid"),
                    purchased_at: parse_timestamp(&purchased_at)
                        .context("Invalid purchased_at timestamp")?,
                })
            })
            .collect()
    }

    fn row_to_item(row: &SqliteRow) -> Result<ShopItem> {
        let kind: String = row.get("kind");

        Ok(ShopItem {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            price: row.get("price"),
            kind: ItemKind::from_str(&kind)
                .ok_or_else(|| anyhow::anyhow!("Invalid item kind: {}", kind))?,
            icon: row.get("icon"),
        })
    }

    // ========================
    // Statistics and integrity
    // ========================

    /// Totals across the whole store.
    pub async fn stats(&self) -> Result<Stats> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM drawings) AS total_drawings,
                (SELECT COUNT(*) FROM likes) AS total_likes
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute stats")?;

        Ok(Stats {
            total_users: row.get("total_users"),
            total_drawings: row.get("total_drawings"),
            total_likes: row.get("total_likes"),
        })
    }

    /// Gather the figures needed to verify the ledger invariants.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let counts = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS user_count,
                (SELECT COUNT(*) FROM drawings) AS drawing_count,
                (SELECT COUNT(*) FROM likes) AS like_count,
                (SELECT COUNT(*) FROM purchases) AS purchase_count
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count rows")?;

        let counter_mismatches: Vec<CounterMismatch> = sqlx::query(
            r#"
            SELECT d.id, d.like_count AS recorded, COUNT(l.id) AS actual
            FROM drawings d
            LEFT JOIN likes l ON l.drawing_id = d.id
            GROUP BY d.id
            HAVING d.like_count != COUNT(l.id)
            ORDER BY d.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to check like counters")?
        .iter()
        .map(|row| CounterMismatch {
            drawing_id: row.get("id"),
            recorded: row.get("recorded"),
            actual: row.get("actual"),
        })
        .collect();

        let negative_balances: Vec<(UserId, Coins)> =
            sqlx::query("SELECT id, balance FROM users WHERE balance < 0")
                .fetch_all(&self.pool)
                .await
                .context("Failed to check balances")?
                .iter()
                .map(|row| (row.get("id"), row.get("balance")))
                .collect();

        let duplicate_likes = self
            .count(
                r#"
                SELECT COUNT(*) AS count FROM (
                    SELECT 1 FROM likes GROUP BY user_id, drawing_id HAVING COUNT(*) > 1
                )
                "#,
            )
            .await?;

        let duplicate_purchases = self
            .count(
                r#"
                SELECT COUNT(*) AS count FROM (
                    SELECT 1 FROM purchases GROUP BY user_id, item_id HAVING COUNT(*) > 1
                )
                "#,
            )
            .await?;

        let dangling_likes = self
            .count(
                r#"
                SELECT COUNT(*) AS count
                FROM likes l
                WHERE NOT EXISTS (SELECT 1 FROM users u WHERE u.id = l.user_id)
                   OR NOT EXISTS (SELECT 1 FROM drawings d WHERE d.id = l.drawing_id)
                "#,
            )
            .await?;

        let dangling_purchases = self
            .count(
                r#"
                SELECT COUNT(*) AS count
                FROM purchases p
                WHERE NOT EXISTS (SELECT 1 FROM users u WHERE u.id = p.user_id)
                   OR NOT EXISTS (SELECT 1 FROM shop_items s WHERE s.id = p.item_id)
                "#,
            )
            .await?;

        Ok(IntegrityStats {
            user_count: counts.get("user_count"),
            drawing_count: counts.get("drawing_count"),
            like_count: counts.get("like_count"),
            purchase_count: counts.get("purchase_count"),
            counter_mismatches,
            negative_balances,
            duplicate_likes,
            duplicate_purchases,
            dangling_likes,
            dangling_purchases,
        })
    }

    async fn count(&self, query: &str) -> Result<i64> {
        Ok(sqlx::query(query)
            .fetch_one(&self.pool)
            .await
            .context("Failed to run integrity query")?
            .get("count"))
    }
}

/// Timestamps are stored as fixed-width RFC 3339 text.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
