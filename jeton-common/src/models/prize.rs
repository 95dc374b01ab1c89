// File: jeton-common/src/models/prize.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A redeemable prize ("cadeau") in a pack's catalog.
///
/// `draw_weight` is a relative likelihood unit (0–100), not a percentage:
/// selection probability is weight / sum-of-weights over the drawable set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prize {
    pub prize_id: Uuid,
    pub pack_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub value: f64,
    pub draw_weight: i32,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prize {
    /// A prize can be drawn only while active with stock remaining.
    pub fn is_drawable(&self) -> bool {
        self.is_active && self.stock > 0
    }
}
