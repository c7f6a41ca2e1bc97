mod common;

use anyhow::Result;
use common::{assert_consistent, balance, create_user, item_priced, test_service, test_service_with};
use drawfy::application::AppError;
use drawfy::config::LedgerConfig;

#[tokio::test]
async fn test_catalog_is_seeded_cheapest_first() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let items = service.list_shop_items().await?;
    assert_eq!(items.len(), 6);
    let prices: Vec<i64> = items.iter().map(|item| item.price).collect();
    assert_eq!(prices, vec![100, 150, 200, 250, 300, 1000]);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_funds_leaves_balance_unchanged() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let buyer = create_user(&service, 3001, "buyer").await?;
    let item = item_priced(&service, 150).await?;

    let result = service.purchase(buyer.id, item.id).await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds {
            balance: 100,
            required: 150
        })
    ));

    assert_eq!(balance(&service, &buyer).await?, 100);
    assert!(service.list_purchases(buyer.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_repeat_purchase_debits_once() -> Result<()> {
    let config = LedgerConfig {
        starting_balance: 500,
        ..LedgerConfig::default()
    };
    let (service, _temp) = test_service_with(config).await?;
    let buyer = create_user(&service, 3001, "buyer").await?;
    let item = item_priced(&service, 200).await?;

    let first = service.purchase(buyer.id, item.id).await?;
    assert_eq!(first.new_balance, 300);

    let second = service.purchase(buyer.id, item.id).await;
    assert!(matches!(second, Err(AppError::AlreadyOwned { .. })));

    assert_eq!(balance(&service, &buyer).await?, 300);
    let owned = service.list_purchases(buyer.id).await?;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].item.id, item.id);
    assert_eq!(owned[0].price, 200);

    assert_consistent(&service).await
}

#[tokio::test]
async fn test_exact_balance_purchase_then_repeat() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let buyer = create_user(&service, 3001, "buyer").await?;
    let item = item_priced(&service, 100).await?;

    let result = service.purchase(buyer.id, item.id).await?;
    assert_eq!(result.new_balance, 0);

    // Ownership is reported before funds
    let repeat = service.purchase(buyer.id, item.id).await;
    assert!(matches!(repeat, Err(AppError::AlreadyOwned { .. })));
    assert_eq!(balance(&service, &buyer).await?, 0);

    assert_consistent(&service).await
}

#[tokio::test]
async fn test_unknown_item() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let buyer = create_user(&service, 3001, "buyer").await?;

    let result = service.purchase(buyer.id, 999).await;
    assert!(matches!(result, Err(AppError::ItemNotFound(999))));
    assert_eq!(balance(&service, &buyer).await?, 100);
    Ok(())
}

#[tokio::test]
async fn test_purchases_of_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.list_purchases(42).await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_repeat_purchase_succeeds_once() -> Result<()> {
    let config = LedgerConfig {
        starting_balance: 1000,
        ..LedgerConfig::default()
    };
    let (service, _temp) = test_service_with(config).await?;
    let buyer_id = create_user(&service, 3001, "buyer").await?.id;
    let item_id = item_priced(&service, 100).await?.id;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.purchase(buyer_id, item_id).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => succeeded += 1,
            Err(AppError::AlreadyOwned { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(service.get_user(buyer_id).await?.balance, 900);
    assert_eq!(service.list_purchases(buyer_id).await?.len(), 1);

    assert_consistent(&service).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_purchases_never_overdraw() -> Result<()> {
    let config = LedgerConfig {
        starting_balance: 250,
        ..LedgerConfig::default()
    };
    let (service, _temp) = test_service_with(config).await?;
    let buyer_id = create_user(&service, 3001, "buyer").await?.id;

    let mut handles = Vec::new();
    for item in service.list_shop_items().await? {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.purchase(buyer_id, item.id).await
        }));
    }

    let mut spent = 0;
    for handle in handles {
        match handle.await? {
            Ok(result) => spent += result.item.price,
            Err(AppError::InsufficientFunds { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let final_balance = service.get_user(buyer_id).await?.balance;
    assert!(spent > 0);
    assert!(final_balance >= 0);
    assert_eq!(final_balance, 250 - spent);

    let paid: i64 = service
        .list_purchases(buyer_id)
        .await?
        .iter()
        .map(|purchase| purchase.price)
        .sum();
    assert_eq!(paid, spent);

    assert_consistent(&service).await
}
