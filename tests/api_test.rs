mod common;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use common::{balance, create_user, item_priced, test_service};
use drawfy::api::{
    auth::{telegram_auth, TelegramAuthRequest},
    drawings::{
        like_drawing, list_drawings, save_drawing, upload_drawing, LikeRequest, UploadRequest,
    },
    shop::{buy_item, list_items, BuyRequest},
    users::{get_user_profile, list_user_purchases},
    AppState, SharedState,
};
use drawfy::application::{AppError, LedgerService};
use drawfy::domain::Identity;
use drawfy::images::ImageStore;
use tempfile::TempDir;

// 1x1 transparent PNG
const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

async fn test_state() -> Result<(SharedState, LedgerService, TempDir)> {
    let (service, temp) = test_service().await?;
    let images = ImageStore::new(temp.path().join("drawings"));
    Ok((AppState::new(service.clone(), images), service, temp))
}

async fn login(state: &SharedState, telegram_id: i64) -> Result<String> {
    let request = TelegramAuthRequest {
        user: Some(Identity::new(telegram_id).with_name("Anna", None)),
    };
    let Json(response) = telegram_auth(State(state.clone()), Ok(Json(request))).await?;
    Ok(response.token)
}

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[tokio::test]
async fn test_telegram_auth_issues_token() -> Result<()> {
    let (state, _service, _temp) = test_state().await?;

    let request = TelegramAuthRequest {
        user: Some(Identity::new(4242).with_username("anna")),
    };
    let Json(response) = telegram_auth(State(state.clone()), Ok(Json(request))).await?;
    assert!(response.success);
    assert_eq!(response.token, "user_4242");
    assert_eq!(response.user.balance, 100);

    // Second contact returns the same user
    let again = login(&state, 4242).await?;
    assert_eq!(again, "user_4242");
    assert_eq!(state.ledger.stats().await?.total_users, 1);

    let missing = telegram_auth(State(state), Ok(Json(TelegramAuthRequest { user: None }))).await;
    assert_eq!(status_of(missing.unwrap_err()), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_unauthenticated_purchase_mutates_nothing() -> Result<()> {
    let (state, service, _temp) = test_state().await?;
    let buyer = create_user(&service, 5001, "buyer").await?;
    let item = item_priced(&service, 100).await?;

    for token in [None, Some("garbage".to_string()), Some("user_".to_string())] {
        let request = BuyRequest {
            token,
            item_id: Some(item.id),
        };
        let err = buy_item(State(state.clone()), Ok(Json(request)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(balance(&service, &buyer).await?, 100);
    assert!(service.list_purchases(buyer.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_caller_is_not_found() -> Result<()> {
    let (state, _service, _temp) = test_state().await?;

    let request = BuyRequest {
        token: Some("user_999".to_string()),
        item_id: Some(1),
    };
    let err = buy_item(State(state), Ok(Json(request))).await.unwrap_err();
    assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_buy_flow() -> Result<()> {
    let (state, service, _temp) = test_state().await?;
    let token = login(&state, 5001).await?;
    let item = item_priced(&service, 100).await?;

    let Json(items) = list_items(State(state.clone())).await?;
    assert_eq!(items.items.len(), 6);

    let missing_item = buy_item(
        State(state.clone()),
        Ok(Json(BuyRequest {
            token: Some(token.clone()),
            item_id: None,
        })),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(missing_item), StatusCode::BAD_REQUEST);

    let buy = || BuyRequest {
        token: Some(token.clone()),
        item_id: Some(item.id),
    };
    let Json(bought) = buy_item(State(state.clone()), Ok(Json(buy()))).await?;
    assert!(bought.success);
    assert_eq!(bought.new_balance, 0);

    let repeat = buy_item(State(state.clone()), Ok(Json(buy()))).await.unwrap_err();
    assert_eq!(status_of(repeat), StatusCode::CONFLICT);

    let poor = buy_item(
        State(state.clone()),
        Ok(Json(BuyRequest {
            token: Some(token.clone()),
            item_id: Some(item_priced(&service, 150).await?.id),
        })),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(poor), StatusCode::BAD_REQUEST);

    let user = state.ledger.resolve_caller(Some(token.as_str())).await?;
    let Json(owned) = list_user_purchases(State(state), Path(user.id)).await?;
    assert_eq!(owned.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_upload_and_like_flow() -> Result<()> {
    let (state, service, temp) = test_state().await?;
    let artist_token = login(&state, 6001).await?;
    let fan_token = login(&state, 6002).await?;

    let Json(uploaded) = upload_drawing(
        State(state.clone()),
        Ok(Json(UploadRequest {
            token: Some(artist_token.clone()),
            title: Some("Sunset".to_string()),
            description: None,
            image: Some(PIXEL.to_string()),
        })),
    )
    .await?;
    assert!(uploaded.success);
    assert_eq!(uploaded.reward.coins, 10);

    let filename = uploaded
        .image_url
        .strip_prefix("/static/drawings/")
        .unwrap()
        .to_string();
    assert!(temp.path().join("drawings").join(filename).exists());

    let Json(gallery) = list_drawings(State(state.clone())).await?;
    assert_eq!(gallery.drawings.len(), 1);
    assert_eq!(gallery.drawings[0].drawing.title, "Sunset");
    assert_eq!(gallery.drawings[0].author_name, "Anna");

    let like = |token: &str| LikeRequest {
        token: Some(token.to_string()),
    };
    let Json(liked) = like_drawing(
        State(state.clone()),
        Path(uploaded.drawing_id),
        Ok(Json(like(&fan_token))),
    )
    .await?;
    assert_eq!(liked.like_count, 1);
    assert_eq!(liked.reward.experience, 1);

    let again = like_drawing(
        State(state.clone()),
        Path(uploaded.drawing_id),
        Ok(Json(like(&fan_token))),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(again), StatusCode::CONFLICT);

    let missing = like_drawing(State(state.clone()), Path(9999), Ok(Json(like(&fan_token))))
        .await
        .unwrap_err();
    assert_eq!(status_of(missing), StatusCode::NOT_FOUND);

    let artist = state.ledger.resolve_caller(Some(artist_token.as_str())).await?;
    let Json(profile) = get_user_profile(State(state), Path(artist.id)).await?;
    assert_eq!(profile.profile.stats.balance, 111);
    assert_eq!(profile.profile.stats.total_likes, 1);
    assert_eq!(profile.profile.recent_drawings.len(), 1);

    assert!(service.check_integrity().await?.is_healthy());
    Ok(())
}

#[tokio::test]
async fn test_upload_rejects_bad_input() -> Result<()> {
    let (state, service, _temp) = test_state().await?;
    let token = login(&state, 6001).await?;

    for image in [None, Some(String::new()), Some("%%%".to_string())] {
        let err = upload_drawing(
            State(state.clone()),
            Ok(Json(UploadRequest {
                token: Some(token.clone()),
                title: None,
                description: None,
                image,
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    let anonymous = upload_drawing(
        State(state),
        Ok(Json(UploadRequest {
            token: None,
            title: None,
            description: None,
            image: Some(PIXEL.to_string()),
        })),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(anonymous), StatusCode::UNAUTHORIZED);

    assert_eq!(service.stats().await?.total_drawings, 0);
    Ok(())
}

#[tokio::test]
async fn test_health_and_stats() -> Result<()> {
    let (state, service, _temp) = test_state().await?;
    let Json(health) = drawfy::api::health_check().await;
    assert!(health.success);
    assert_eq!(health.status, "healthy");

    create_user(&service, 7001, "someone").await?;
    let Json(stats) = drawfy::api::stats(State(state)).await?;
    assert_eq!(stats.stats.total_users, 1);
    assert_eq!(stats.stats.total_drawings, 0);
    Ok(())
}

#[tokio::test]
async fn test_failed_upload_leaves_no_image() -> Result<()> {
    let (state, service, temp) = test_state().await?;

    let request = UploadRequest {
        token: None,
        title: Some("Orphan".to_string()),
        description: None,
        image: Some(PIXEL.to_string()),
    };
    let err = save_drawing(&state, 9999, request).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound(_)));

    let dir = temp.path().join("drawings");
    let leftover = match std::fs::read_dir(&dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    };
    assert_eq!(leftover, 0);
    assert_eq!(service.stats().await?.total_drawings, 0);
    Ok(())
}
