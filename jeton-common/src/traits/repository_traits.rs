// File: jeton-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Error;
use crate::models::history::HistoryEntry;
use crate::models::points::{PointGrant, RewardPoints};
use crate::models::prize::Prize;
use crate::models::threshold_rate::{Frequency, ThresholdRate};
use crate::models::ticket::WinningTicket;
use crate::models::token::{RewardToken, TokenFilter};

/// Per-(user, pack) bonus point balances plus the per-period grant ledger.
///
/// Mutations that must share a transaction with other writes take a
/// `&mut PgConnection` (`*_in` variants); services pass `&mut *tx`.
#[async_trait]
pub trait RewardPointsRepository: Send + Sync {
    async fn get(&self, user_id: Uuid, pack_id: Uuid) -> Result<Option<RewardPoints>, Error>;

    /// Upserts the row and adds `points` to `available_points`, returning
    /// the updated balance.
    async fn add_points_in(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        pack_id: Uuid,
        points: i64,
    ) -> Result<RewardPoints, Error>;

    /// Conditionally moves `points` from available to used. Returns false if
    /// `available_points < points` at execution time (the conditional UPDATE
    /// matched no row), so callers never read-then-write.
    async fn debit_in(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        pack_id: Uuid,
        points: i64,
    ) -> Result<bool, Error>;

    /// Records a threshold-crossing grant. Returns false when a grant for
    /// the same (user, pack, frequency, period_start) already exists.
    async fn record_grant_in(
        &self,
        conn: &mut PgConnection,
        grant: &PointGrant,
    ) -> Result<bool, Error>;
}

#[async_trait]
pub trait ThresholdRateRepository: Send + Sync {
    async fn create(&self, rate: &ThresholdRate) -> Result<(), Error>;
    async fn get(&self, pack_id: Uuid, frequency: Frequency)
        -> Result<Option<ThresholdRate>, Error>;
    async fn list_for_pack(&self, pack_id: Uuid) -> Result<Vec<ThresholdRate>, Error>;
    async fn list_all(&self) -> Result<Vec<ThresholdRate>, Error>;
}

#[async_trait]
pub trait RewardTokenRepository: Send + Sync {
    /// Inserts the token. Returns false when `unique_code` collided with an
    /// existing row; the issuer regenerates and retries.
    async fn insert_in(&self, conn: &mut PgConnection, token: &RewardToken)
        -> Result<bool, Error>;

    async fn get_by_code(&self, code: &str) -> Result<Option<RewardToken>, Error>;

    /// Conditionally flips `is_used`, guarded by `is_used = FALSE AND
    /// expires_at > now`. Returns false when the guard failed; the caller
    /// re-reads the row to tell already-used from expired.
    async fn mark_used_in(
        &self,
        conn: &mut PgConnection,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, Error>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: TokenFilter,
    ) -> Result<Vec<RewardToken>, Error>;
}

#[async_trait]
pub trait PrizeRepository: Send + Sync {
    async fn create(&self, prize: &Prize) -> Result<(), Error>;
    async fn update(&self, prize: &Prize) -> Result<(), Error>;
    async fn get(&self, prize_id: Uuid) -> Result<Option<Prize>, Error>;
    async fn list_for_pack(&self, pack_id: Uuid) -> Result<Vec<Prize>, Error>;

    /// Active prizes with stock, ordered by draw_weight descending with ties
    /// broken by prize_id so draws are deterministic under a fixed roll.
    async fn list_drawable(&self, pack_id: Uuid) -> Result<Vec<Prize>, Error>;

    /// Atomic `stock = stock - 1` guarded by `stock > 0`. Returns false when
    /// a concurrent draw took the last unit first.
    async fn decrement_stock(&self, prize_id: Uuid) -> Result<bool, Error>;

    /// Compensating inverse of `decrement_stock`, used when a draw has to be
    /// undone after the stock was already taken.
    async fn increment_stock(&self, prize_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait WinningTicketRepository: Send + Sync {
    /// Returns false when `verification_code` collided; the caller retries
    /// with a fresh code.
    async fn insert_in(
        &self,
        conn: &mut PgConnection,
        ticket: &WinningTicket,
    ) -> Result<bool, Error>;

    async fn get_by_id(&self, ticket_id: Uuid) -> Result<Option<WinningTicket>, Error>;
    async fn get_by_verification_code(&self, code: &str)
        -> Result<Option<WinningTicket>, Error>;

    /// Conditionally sets `consumed`, guarded by `NOT consumed AND
    /// expires_at > now`. Returns false when the guard failed.
    async fn consume_in(
        &self,
        conn: &mut PgConnection,
        ticket_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, Error>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WinningTicket>, Error>;
}

/// Append-only by construction: no update or delete method exists.
#[async_trait]
pub trait RewardHistoryRepository: Send + Sync {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), Error>;
    async fn record_in(&self, conn: &mut PgConnection, entry: &HistoryEntry)
        -> Result<(), Error>;

    async fn list_for_user(&self, user_id: Uuid, limit: i64)
        -> Result<Vec<HistoryEntry>, Error>;
    async fn list_for_token(&self, token_id: Uuid) -> Result<Vec<HistoryEntry>, Error>;
    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<HistoryEntry>, Error>;
}
