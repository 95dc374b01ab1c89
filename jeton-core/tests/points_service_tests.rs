// File: jeton-core/tests/points_service_tests.rs
//
// PointsService tests with a mocked wallet collaborator. Set
// TEST_DATABASE_URL to run; without it every test skips.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use jeton_common::models::history::HistoryAction;
use jeton_common::models::threshold_rate::{Frequency, ThresholdRate};
use jeton_common::traits::repository_traits::{
    RewardHistoryRepository, ThresholdRateRepository,
};
use jeton_common::traits::wallet_traits::{MockWalletClient, WalletTransaction};
use jeton_core::repositories::postgres::{
    PostgresRewardHistoryRepository, PostgresRewardPointsRepository,
    PostgresRewardTokenRepository, PostgresThresholdRateRepository,
};
use jeton_core::services::{PointsService, TokenService};
use jeton_core::tasks::period_start;
use jeton_core::test_utils::helpers::setup_test_database;
use jeton_core::{Database, Error};

fn accepting_wallet() -> MockWalletClient {
    let mut wallet = MockWalletClient::new();
    wallet.expect_credit().returning(|user_id, amount, reason, key, _meta| {
        Ok(WalletTransaction {
            transaction_id: Uuid::new_v4(),
            user_id,
            amount,
            reason: reason.to_string(),
            idempotency_key: key,
            created_at: Utc::now(),
        })
    });
    wallet
}

fn build_service(db: &Database, wallet: MockWalletClient) -> PointsService {
    let pool = db.pool().clone();
    let history_repo = Arc::new(PostgresRewardHistoryRepository::new(pool.clone()));
    let token_service = Arc::new(TokenService::new(
        db.clone(),
        Arc::new(PostgresRewardTokenRepository::new(pool.clone())),
        history_repo.clone(),
    ));
    PointsService::new(
        db.clone(),
        Arc::new(PostgresRewardPointsRepository::new(pool.clone())),
        Arc::new(PostgresThresholdRateRepository::new(pool.clone())),
        history_repo,
        Arc::new(wallet),
        token_service,
    )
}

async fn create_weekly_rate(db: &Database, pack_id: Uuid) -> Result<ThresholdRate, Error> {
    let rate = ThresholdRate {
        rate_id: Uuid::new_v4(),
        pack_id,
        frequency: Frequency::Weekly,
        referral_threshold: 5,
        points_per_threshold: 1,
        currency_value_per_point: 2.0,
        created_at: Utc::now(),
    };
    PostgresThresholdRateRepository::new(db.pool().clone())
        .create(&rate)
        .await?;
    Ok(rate)
}

#[tokio::test]
async fn test_weekly_rate_conversion_scenario() -> Result<(), Error> {
    // Pack P: (weekly, threshold=5, points=1, value=2.0).
    // Grant 5 points, convert 5 => wallet credited 10.0, available 0.
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    create_weekly_rate(&db, pack_id).await?;

    let mut wallet = MockWalletClient::new();
    wallet
        .expect_credit()
        .withf(move |uid, amount, _reason, _key, _meta| {
            *uid == user_id && (*amount - 10.0).abs() < f64::EPSILON
        })
        .times(1)
        .returning(|user_id, amount, reason, key, _meta| {
            Ok(WalletTransaction {
                transaction_id: Uuid::new_v4(),
                user_id,
                amount,
                reason: reason.to_string(),
                idempotency_key: key,
                created_at: Utc::now(),
            })
        });
    let service = build_service(&db, wallet);

    service
        .grant_points(user_id, pack_id, 5, "weekly referral threshold", None)
        .await?;

    let amount = service.convert_to_wallet(user_id, pack_id, 5).await?;
    assert!((amount - 10.0).abs() < f64::EPSILON);

    let balance = service.get_points(user_id, pack_id).await?.expect("exists");
    assert_eq!(balance.available_points, 0);
    assert_eq!(balance.used_points, 5);
    Ok(())
}

#[tokio::test]
async fn test_points_conservation_across_grant_and_convert() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    create_weekly_rate(&db, pack_id).await?;
    let service = build_service(&db, accepting_wallet());

    service.grant_points(user_id, pack_id, 5, "grant A", None).await?;
    service.grant_points(user_id, pack_id, 3, "grant B", None).await?;
    let before = service.get_points(user_id, pack_id).await?.expect("exists");
    assert_eq!(before.total_granted(), 8);

    service.convert_to_wallet(user_id, pack_id, 6).await?;
    let after = service.get_points(user_id, pack_id).await?.expect("exists");
    // Conversion moves points, never destroys them.
    assert_eq!(after.available_points, 2);
    assert_eq!(after.used_points, 6);
    assert_eq!(after.total_granted(), 8);

    // History carries one attribution per grant and one conversion.
    let history = PostgresRewardHistoryRepository::new(db.pool().clone())
        .list_for_user(user_id, 10)
        .await?;
    let attributions = history
        .iter()
        .filter(|e| e.action == HistoryAction::Attribution)
        .count();
    let conversions = history
        .iter()
        .filter(|e| e.action == HistoryAction::Conversion)
        .count();
    assert_eq!(attributions, 2);
    assert_eq!(conversions, 1);
    Ok(())
}

#[tokio::test]
async fn test_conversion_error_kinds() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let service = build_service(&db, accepting_wallet());

    // No weekly rate configured at all.
    let err = service.convert_to_wallet(user_id, pack_id, 5).await.unwrap_err();
    assert!(matches!(err, Error::NoRateConfigured { .. }));

    create_weekly_rate(&db, pack_id).await?;
    service.grant_points(user_id, pack_id, 3, "small grant", None).await?;

    let err = service.convert_to_wallet(user_id, pack_id, 5).await.unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientPoints {
            requested: 5,
            available: 3
        }
    ));
    Ok(())
}

#[tokio::test]
async fn test_wallet_failure_rolls_back_the_debit() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    create_weekly_rate(&db, pack_id).await?;

    let mut wallet = MockWalletClient::new();
    wallet
        .expect_credit()
        .times(1)
        .returning(|_, _, _, _, _| Err(Error::Wallet("wallet service unavailable".to_string())));
    let service = build_service(&db, wallet);

    service.grant_points(user_id, pack_id, 5, "grant", None).await?;
    let err = service.convert_to_wallet(user_id, pack_id, 5).await.unwrap_err();
    assert!(matches!(err, Error::Wallet(_)));

    // Debit-without-credit must not survive.
    let balance = service.get_points(user_id, pack_id).await?.expect("exists");
    assert_eq!(balance.available_points, 5);
    assert_eq!(balance.used_points, 0);

    // And no conversion history entry was written.
    let history = PostgresRewardHistoryRepository::new(db.pool().clone())
        .list_for_user(user_id, 10)
        .await?;
    assert!(
        history
            .iter()
            .all(|e| e.action != HistoryAction::Conversion)
    );
    Ok(())
}

#[tokio::test]
async fn test_grant_for_crossing_is_idempotent_and_mints_tokens() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let rate = create_weekly_rate(&db, pack_id).await?;
    let service = build_service(&db, accepting_wallet());

    let period = period_start(Frequency::Weekly, Utc::now());

    // 11 referrals at threshold 5 => two crossings: 2 points, 2 tokens.
    let (balance, tokens) = service
        .grant_for_crossing(user_id, &rate, period, 11, true)
        .await?;
    assert_eq!(balance.available_points, 2);
    assert_eq!(tokens.len(), 2);
    for token in &tokens {
        assert_eq!(token.pack_id, pack_id);
        assert!(token.is_usable_at(Utc::now()));
    }

    // A second pass over the same period is refused before any mutation.
    let err = service
        .grant_for_crossing(user_id, &rate, period, 12, true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateGrant { .. }));
    let balance = service.get_points(user_id, pack_id).await?.expect("exists");
    assert_eq!(balance.available_points, 2);
    Ok(())
}

#[tokio::test]
async fn test_grant_rejects_non_positive_amounts() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let service = build_service(&db, accepting_wallet());
    let err = service
        .grant_points(Uuid::new_v4(), Uuid::new_v4(), 0, "nothing", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    Ok(())
}
