// File: jeton-common/src/models/token.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Single-use reward token ("jeton") granting one lottery draw attempt.
///
/// Expiration is never stored as a transition: it is derived from
/// `expires_at` at read time, so a token past its deadline is invalid even
/// if no background job has run.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RewardToken {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub pack_id: Uuid,
    pub unique_code: String,
    pub is_used: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl RewardToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired_at(now)
    }

    /// Errors with the precise kind a caller must branch on for user
    /// messaging: already-used wins over expired.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.is_used {
            return Err(Error::TokenAlreadyUsed(self.unique_code.clone()));
        }
        if self.is_expired_at(now) {
            return Err(Error::TokenExpired(self.unique_code.clone()));
        }
        Ok(())
    }
}

/// Listing filter for a user's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFilter {
    Usable,
    Used,
    Expired,
}
