// File: jeton-common/src/models/mod.rs
pub mod points;
pub mod threshold_rate;
pub mod token;
pub mod prize;
pub mod ticket;
pub mod history;

pub use points::{PointGrant, RewardPoints};
pub use threshold_rate::{Frequency, ThresholdRate};
pub use token::{RewardToken, TokenFilter};
pub use prize::Prize;
pub use ticket::WinningTicket;
pub use history::{HistoryAction, HistoryEntry};
