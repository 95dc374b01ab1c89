// File: jeton-common/src/traits/wallet_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Receipt returned by the external wallet for a credit operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub reason: String,
    pub idempotency_key: Uuid,
    pub created_at: DateTime<Utc>,
}

/// External wallet collaborator. Balance storage and the transaction ledger
/// are a black box behind this trait.
///
/// `idempotency_key` is unique per conversion so a retried credit call can
/// be deduplicated on the wallet side and never double-credits.
#[automock]
#[async_trait]
pub trait WalletClient: Send + Sync {
    async fn credit(
        &self,
        user_id: Uuid,
        amount: f64,
        reason: &str,
        idempotency_key: Uuid,
        metadata: Option<serde_json::Value>,
    ) -> Result<WalletTransaction, Error>;
}
