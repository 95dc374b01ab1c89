// File: jeton-core/tests/lottery_tests.rs
//
// End-to-end redemption tests: weighted draw, stock depletion under
// concurrency, token single-use. Set TEST_DATABASE_URL to run; without it
// every test skips.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures_util::future::join_all;
use uuid::Uuid;

use jeton_common::models::history::HistoryAction;
use jeton_common::models::prize::Prize;
use jeton_common::traits::repository_traits::{
    PrizeRepository, RewardHistoryRepository,
};
use jeton_core::repositories::postgres::{
    PostgresPrizeRepository, PostgresRewardHistoryRepository, PostgresRewardTokenRepository,
    PostgresWinningTicketRepository,
};
use jeton_core::services::{LotteryService, RollSource, TokenService};
use jeton_core::test_utils::helpers::setup_test_database;
use jeton_core::{Database, Error};

/// Deterministic roll: always returns `fraction * upper`.
struct FixedRoll(f64);

impl RollSource for FixedRoll {
    fn roll(&self, upper: f64) -> f64 {
        self.0 * upper
    }
}

fn build_services(db: &Database, roll: Arc<dyn RollSource>) -> (Arc<TokenService>, Arc<LotteryService>) {
    let pool = db.pool().clone();
    let token_repo = Arc::new(PostgresRewardTokenRepository::new(pool.clone()));
    let history_repo = Arc::new(PostgresRewardHistoryRepository::new(pool.clone()));
    let token_service = Arc::new(TokenService::new(
        db.clone(),
        token_repo.clone(),
        history_repo.clone(),
    ));
    let lottery = Arc::new(LotteryService::new(
        db.clone(),
        token_repo,
        Arc::new(PostgresPrizeRepository::new(pool.clone())),
        Arc::new(PostgresWinningTicketRepository::new(pool.clone())),
        history_repo,
        roll,
        None,
    ));
    (token_service, lottery)
}

async fn create_prize(db: &Database, pack_id: Uuid, weight: i32, stock: i32) -> Result<Prize, Error> {
    let now = Utc::now();
    let prize = Prize {
        prize_id: Uuid::new_v4(),
        pack_id,
        name: format!("prize-{}", Uuid::new_v4()),
        description: None,
        image_ref: None,
        value: 50.0,
        draw_weight: weight,
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    PostgresPrizeRepository::new(db.pool().clone())
        .create(&prize)
        .await?;
    Ok(prize)
}

#[tokio::test]
async fn test_redeem_issues_ticket_and_consumes_token() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.0)));
    let prize = create_prize(&db, pack_id, 50, 3).await?;

    let token = token_service
        .issue_token(user_id, pack_id, Duration::hours(24))
        .await?;

    let outcome = lottery.redeem(user_id, &token.unique_code).await?;
    assert_eq!(outcome.prize.prize_id, prize.prize_id);
    assert_eq!(outcome.ticket.user_id, user_id);
    assert_eq!(outcome.ticket.source_token_code, token.unique_code);
    assert!(outcome.ticket.verification_code.starts_with("WIN-"));
    assert!(outcome.ticket.is_valid_at(Utc::now()));
    // 48h validity window from issuance.
    let window = outcome.ticket.expires_at - outcome.ticket.issued_at;
    assert_eq!(window.num_hours(), 48);

    // Stock went down by one, token is spent.
    let stored = PostgresPrizeRepository::new(db.pool().clone())
        .get(prize.prize_id)
        .await?
        .expect("exists");
    assert_eq!(stored.stock, 2);
    let err = token_service.validate(&token.unique_code).await.unwrap_err();
    assert!(matches!(err, Error::TokenAlreadyUsed(_)));

    // Exactly one utilisation history entry, linking token, ticket, prize.
    let history = PostgresRewardHistoryRepository::new(db.pool().clone())
        .list_for_token(token.token_id)
        .await?;
    let utilisations: Vec<_> = history
        .iter()
        .filter(|e| e.action == HistoryAction::Utilisation)
        .collect();
    assert_eq!(utilisations.len(), 1);
    assert_eq!(utilisations[0].ticket_id, Some(outcome.ticket.ticket_id));
    assert_eq!(utilisations[0].prize_id, Some(prize.prize_id));
    Ok(())
}

#[tokio::test]
async fn test_out_of_stock_catalog_leaves_token_usable() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.0)));
    // Active prize with zero stock: not drawable.
    create_prize(&db, pack_id, 50, 0).await?;

    let token = token_service
        .issue_token(user_id, pack_id, Duration::hours(24))
        .await?;

    let err = lottery.redeem(user_id, &token.unique_code).await.unwrap_err();
    assert!(matches!(err, Error::NoPrizeAvailable(_)));

    // No draw occurred: the token may be retried later.
    let again = token_service.validate(&token.unique_code).await?;
    assert!(!again.is_used);
    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_rejected_lazily() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.0)));
    create_prize(&db, pack_id, 50, 3).await?;

    let token = token_service
        .issue_token(user_id, pack_id, Duration::minutes(-5))
        .await?;

    let err = token_service.validate(&token.unique_code).await.unwrap_err();
    assert!(matches!(err, Error::TokenExpired(_)));
    let err = lottery.redeem(user_id, &token.unique_code).await.unwrap_err();
    assert!(matches!(err, Error::TokenExpired(_)));
    Ok(())
}

#[tokio::test]
async fn test_token_owned_by_someone_else_is_not_found() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (owner, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.0)));
    create_prize(&db, pack_id, 50, 3).await?;

    let token = token_service
        .issue_token(owner, pack_id, Duration::hours(24))
        .await?;

    let stranger = Uuid::new_v4();
    let err = lottery.redeem(stranger, &token.unique_code).await.unwrap_err();
    assert!(matches!(err, Error::TokenNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_same_token_redeemed_concurrently_yields_one_ticket() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.0)));
    let prize = create_prize(&db, pack_id, 50, 10).await?;

    let token = token_service
        .issue_token(user_id, pack_id, Duration::hours(24))
        .await?;

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let lottery = lottery.clone();
            let code = token.unique_code.clone();
            tokio::spawn(async move { lottery.redeem(user_id, &code).await })
        })
        .collect();
    let results: Vec<Result<_, Error>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task not cancelled"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let already_used = results
        .iter()
        .filter(|r| matches!(r, Err(Error::TokenAlreadyUsed(_))))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(already_used, 1);

    // The loser's compensating restock keeps the stock consistent: exactly
    // one unit left the catalog.
    let stored = PostgresPrizeRepository::new(db.pool().clone())
        .get(prize.prize_id)
        .await?
        .expect("exists");
    assert_eq!(stored.stock, 9);
    Ok(())
}

#[tokio::test]
async fn test_stock_of_one_is_never_oversold() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let pack_id = Uuid::new_v4();
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.0)));
    let prize = create_prize(&db, pack_id, 50, 1).await?;

    // Four users, four valid tokens, one unit of stock.
    let mut tokens = Vec::new();
    for _ in 0..4 {
        let user_id = Uuid::new_v4();
        let token = token_service
            .issue_token(user_id, pack_id, Duration::hours(24))
            .await?;
        tokens.push((user_id, token));
    }

    let tasks: Vec<_> = tokens
        .iter()
        .map(|(user_id, token)| {
            let lottery = lottery.clone();
            let user_id = *user_id;
            let code = token.unique_code.clone();
            tokio::spawn(async move { lottery.redeem(user_id, &code).await })
        })
        .collect();
    let results: Vec<Result<_, Error>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task not cancelled"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let no_draw = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(Error::NoPrizeAvailable(_)) | Err(Error::DrawConflict(_))
            )
        })
        .count();
    assert_eq!(wins, 1);
    assert_eq!(no_draw, 3);

    let stored = PostgresPrizeRepository::new(db.pool().clone())
        .get(prize.prize_id)
        .await?
        .expect("exists");
    assert_eq!(stored.stock, 0);
    Ok(())
}

#[tokio::test]
async fn test_weighted_roll_selects_down_the_catalog() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return Ok(());
    };
    let (user_id, pack_id) = (Uuid::new_v4(), Uuid::new_v4());
    // A roll in the last decile must select the lightest prize
    // (catalog order is weight desc).
    let (token_service, lottery) = build_services(&db, Arc::new(FixedRoll(0.95)));
    create_prize(&db, pack_id, 70, 5).await?;
    create_prize(&db, pack_id, 20, 5).await?;
    let light = create_prize(&db, pack_id, 10, 5).await?;

    let token = token_service
        .issue_token(user_id, pack_id, Duration::hours(24))
        .await?;
    let outcome = lottery.redeem(user_id, &token.unique_code).await?;
    assert_eq!(outcome.prize.prize_id, light.prize_id);
    Ok(())
}
