// src/services/mod.rs

pub mod points_service;
pub mod token_service;
pub mod lottery_service;
pub mod ticket_service;

pub use points_service::PointsService;
pub use token_service::TokenService;
pub use lottery_service::{DrawOutcome, LotteryService, RollSource, ThreadRngRoll};
pub use ticket_service::TicketService;
