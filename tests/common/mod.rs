// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::{Context, Result};
use drawfy::application::LedgerService;
use drawfy::config::LedgerConfig;
use drawfy::domain::{Coins, Drawing, Identity, NewDrawing, ShopItem, User};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    test_service_with(LedgerConfig::default()).await
}

/// Helper to create a test service with a custom ledger configuration
pub async fn test_service_with(config: LedgerConfig) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap(), config).await?;
    Ok((service, temp_dir))
}

/// Authenticate a chat-platform user, creating it on first contact
pub async fn create_user(service: &LedgerService, telegram_id: i64, username: &str) -> Result<User> {
    let identity = Identity::new(telegram_id).with_username(username);
    Ok(service.authenticate(&identity).await?.user)
}

/// Upload a drawing for a user and return it
pub async fn upload(service: &LedgerService, user: &User, title: &str) -> Result<Drawing> {
    let drawing = NewDrawing::new(user.id, format!("drawing_{}_{}.png", user.id, title))
        .with_title(Some(title.to_string()));
    Ok(service.record_upload(drawing).await?.drawing)
}

/// Find the catalog item with the given price
pub async fn item_priced(service: &LedgerService, price: Coins) -> Result<ShopItem> {
    service
        .list_shop_items()
        .await?
        .into_iter()
        .find(|item| item.price == price)
        .with_context(|| format!("No shop item priced {}", price))
}

/// Current balance of a user
pub async fn balance(service: &LedgerService, user: &User) -> Result<Coins> {
    Ok(service.get_user(user.id).await?.balance)
}

/// Assert the integrity check finds nothing wrong
pub async fn assert_consistent(service: &LedgerService) -> Result<()> {
    let report = service.check_integrity().await?;
    assert!(
        report.is_healthy(),
        "integrity issues: {:?}",
        report.issues
    );
    Ok(())
}
