// File: jeton-common/src/traits/referral_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::error::Error;

/// External referral-graph collaborator, consumed by the crossing scheduler
/// that decides when to grant points and mint tokens.
#[automock]
#[async_trait]
pub trait ReferralGraph: Send + Sync {
    /// Number of referrals `user_id` has accumulated since `since`.
    async fn count_referrals(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<i64, Error>;

    /// Users with at least one referral since `since`; the scheduler only
    /// evaluates these instead of walking the whole user base.
    async fn active_referrers(&self, since: DateTime<Utc>) -> Result<Vec<Uuid>, Error>;
}
