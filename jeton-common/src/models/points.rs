// File: jeton-common/src/models/points.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::threshold_rate::Frequency;

/// Per-user, per-pack bonus point balance. Created lazily on first grant,
/// never deleted. `used_points` only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RewardPoints {
    pub user_id: Uuid,
    pub pack_id: Uuid,
    pub available_points: i64,
    pub used_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RewardPoints {
    /// Total ever granted to this (user, pack) pair.
    pub fn total_granted(&self) -> i64 {
        self.available_points + self.used_points
    }
}

/// One recorded threshold crossing. The unique index on
/// (user_id, pack_id, frequency, period_start) is what makes point granting
/// idempotent per period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointGrant {
    pub grant_id: Uuid,
    pub user_id: Uuid,
    pub pack_id: Uuid,
    pub frequency: Frequency,
    pub period_start: DateTime<Utc>,
    /// Referral count observed when the grant was made, kept for audit.
    pub referral_count: i64,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}
