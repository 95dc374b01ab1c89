// src/repositories/mod.rs

pub mod postgres;

pub use postgres::{
    PostgresPrizeRepository, PostgresRewardHistoryRepository, PostgresRewardPointsRepository,
    PostgresRewardTokenRepository, PostgresThresholdRateRepository,
    PostgresWinningTicketRepository,
};
