// src/repositories/postgres/mod.rs

pub mod reward_points;
pub mod threshold_rates;
pub mod reward_tokens;
pub mod prizes;
pub mod winning_tickets;
pub mod reward_history;

pub use reward_points::PostgresRewardPointsRepository;
pub use threshold_rates::PostgresThresholdRateRepository;
pub use reward_tokens::PostgresRewardTokenRepository;
pub use prizes::PostgresPrizeRepository;
pub use winning_tickets::PostgresWinningTicketRepository;
pub use reward_history::PostgresRewardHistoryRepository;
