// jeton-server/src/collaborators.rs
//
// Stand-ins for the external collaborators at the binary edge. The real
// wallet ledger, referral graph and notification pipeline live in other
// services; these implementations let the engine run end to end without
// them.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::traits::notifier_traits::{Notifier, RewardEvent};
use jeton_common::traits::referral_traits::ReferralGraph;
use jeton_common::traits::wallet_traits::{WalletClient, WalletTransaction};

/// Accepts every credit and logs it.
pub struct LoggingWallet;

#[async_trait]
impl WalletClient for LoggingWallet {
    async fn credit(
        &self,
        user_id: Uuid,
        amount: f64,
        reason: &str,
        idempotency_key: Uuid,
        _metadata: Option<serde_json::Value>,
    ) -> Result<WalletTransaction, Error> {
        info!(
            "Wallet credit: user {} amount {} ({}), key {}",
            user_id, amount, reason, idempotency_key
        );
        Ok(WalletTransaction {
            transaction_id: Uuid::new_v4(),
            user_id,
            amount,
            reason: reason.to_string(),
            idempotency_key,
            created_at: Utc::now(),
        })
    }
}

/// Reports no referral activity; the scheduler idles until a real referral
/// graph is wired in.
pub struct EmptyReferralGraph;

#[async_trait]
impl ReferralGraph for EmptyReferralGraph {
    async fn count_referrals(
        &self,
        _user_id: Uuid,
        _since: chrono::DateTime<Utc>,
    ) -> Result<i64, Error> {
        Ok(0)
    }

    async fn active_referrers(
        &self,
        _since: chrono::DateTime<Utc>,
    ) -> Result<Vec<Uuid>, Error> {
        Ok(Vec::new())
    }
}

pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, user_id: Uuid, event: RewardEvent) -> Result<(), Error> {
        info!("Notify user {}: {:?}", user_id, event);
        Ok(())
    }
}
