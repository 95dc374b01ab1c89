use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use jeton_core::Database;
use jeton_core::repositories::postgres::{
    PostgresPrizeRepository, PostgresRewardHistoryRepository, PostgresRewardPointsRepository,
    PostgresRewardTokenRepository, PostgresThresholdRateRepository,
    PostgresWinningTicketRepository,
};
use jeton_core::services::{LotteryService, PointsService, ThreadRngRoll, TicketService, TokenService};
use jeton_core::tasks::{CrossingScheduler, spawn_crossing_scheduler};

mod collaborators;
use collaborators::{EmptyReferralGraph, LoggingNotifier, LoggingWallet};

#[derive(Parser, Debug, Clone)]
#[command(name = "jeton")]
#[command(author, version, about = "Jeton - reward token & bonus points engine")]
struct Args {
    /// Postgres connection URL.
    #[arg(long, default_value = "postgres://jeton@localhost:5432/jeton")]
    db_url: String,

    /// Seconds between threshold-crossing evaluation passes.
    #[arg(long, default_value = "3600")]
    scheduler_interval_secs: u64,

    /// Mint one reward token per threshold crossing in addition to points.
    #[arg(long, default_value = "true")]
    mint_tokens: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("jeton=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let db = Database::new(&args.db_url).await?;
    db.migrate().await?;

    let pool = db.pool().clone();
    let points_repo = Arc::new(PostgresRewardPointsRepository::new(pool.clone()));
    let rate_repo = Arc::new(PostgresThresholdRateRepository::new(pool.clone()));
    let token_repo = Arc::new(PostgresRewardTokenRepository::new(pool.clone()));
    let prize_repo = Arc::new(PostgresPrizeRepository::new(pool.clone()));
    let ticket_repo = Arc::new(PostgresWinningTicketRepository::new(pool.clone()));
    let history_repo = Arc::new(PostgresRewardHistoryRepository::new(pool.clone()));

    let token_service = Arc::new(TokenService::new(
        db.clone(),
        token_repo.clone(),
        history_repo.clone(),
    ));
    let points_service = Arc::new(PointsService::new(
        db.clone(),
        points_repo.clone(),
        rate_repo.clone(),
        history_repo.clone(),
        Arc::new(LoggingWallet),
        token_service.clone(),
    ));
    let _lottery_service = Arc::new(LotteryService::new(
        db.clone(),
        token_repo.clone(),
        prize_repo.clone(),
        ticket_repo.clone(),
        history_repo.clone(),
        Arc::new(ThreadRngRoll),
        Some(Arc::new(LoggingNotifier)),
    ));
    let _ticket_service = Arc::new(TicketService::new(
        db.clone(),
        ticket_repo.clone(),
        history_repo.clone(),
    ));

    let scheduler = Arc::new(CrossingScheduler::new(
        rate_repo.clone(),
        Arc::new(EmptyReferralGraph),
        points_service.clone(),
        args.mint_tokens,
    ));
    let scheduler_handle = spawn_crossing_scheduler(
        scheduler,
        Duration::from_secs(args.scheduler_interval_secs),
    );
    info!(
        "Crossing scheduler running every {}s; Ctrl-C to stop",
        args.scheduler_interval_secs
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    scheduler_handle.abort();

    Ok(())
}
