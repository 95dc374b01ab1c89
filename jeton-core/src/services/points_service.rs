// File: jeton-core/src/services/points_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::history::{HistoryAction, HistoryEntry};
use jeton_common::models::points::{PointGrant, RewardPoints};
use jeton_common::models::threshold_rate::{Frequency, ThresholdRate};
use jeton_common::models::token::RewardToken;
use jeton_common::traits::repository_traits::{
    RewardHistoryRepository, RewardPointsRepository, ThresholdRateRepository,
};
use jeton_common::traits::wallet_traits::WalletClient;

use crate::db::Database;
use crate::services::token_service::{DEFAULT_TOKEN_TTL_HOURS, TokenService};

/// Bonus point accounting per (user, pack): grants, threshold-crossing
/// grants with their idempotency ledger, and point-to-wallet conversion.
pub struct PointsService {
    db: Database,
    points_repo: Arc<dyn RewardPointsRepository>,
    rate_repo: Arc<dyn ThresholdRateRepository>,
    history_repo: Arc<dyn RewardHistoryRepository>,
    wallet: Arc<dyn WalletClient>,
    token_service: Arc<TokenService>,
}

impl PointsService {
    pub fn new(
        db: Database,
        points_repo: Arc<dyn RewardPointsRepository>,
        rate_repo: Arc<dyn ThresholdRateRepository>,
        history_repo: Arc<dyn RewardHistoryRepository>,
        wallet: Arc<dyn WalletClient>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            db,
            points_repo,
            rate_repo,
            history_repo,
            wallet,
            token_service,
        }
    }

    pub async fn get_points(
        &self,
        user_id: Uuid,
        pack_id: Uuid,
    ) -> Result<Option<RewardPoints>, Error> {
        self.points_repo.get(user_id, pack_id).await
    }

    /// Adds `points` to the user's available balance and writes one
    /// `attribution` history entry, in one transaction.
    ///
    /// Performs no deduplication: callers managing their own idempotency use
    /// this directly; threshold crossings go through `grant_for_crossing`.
    pub async fn grant_points(
        &self,
        user_id: Uuid,
        pack_id: Uuid,
        points: i64,
        description: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<RewardPoints, Error> {
        if points <= 0 {
            return Err(Error::Validation(format!(
                "Grant must be positive, got {}",
                points
            )));
        }

        let mut tx = self.db.pool().begin().await?;
        let balance = self
            .points_repo
            .add_points_in(&mut *tx, user_id, pack_id, points)
            .await?;

        let mut entry =
            HistoryEntry::new(user_id, HistoryAction::Attribution, description.to_string())
                .with_metadata(json!({ "pack_id": pack_id, "points": points }));
        if let Some(extra) = metadata {
            entry.metadata = Some(json!({
                "pack_id": pack_id,
                "points": points,
                "extra": extra,
            }));
        }
        self.history_repo.record_in(&mut *tx, &entry).await?;
        tx.commit().await?;

        info!(
            "Granted {} points to user {} (pack {}, available now {})",
            points, user_id, pack_id, balance.available_points
        );
        Ok(balance)
    }

    /// Grants points for the threshold crossings of one period, exactly
    /// once: the grant row under its unique (user, pack, frequency, period)
    /// index is inserted first, and a second attempt for the same period
    /// fails with `DuplicateGrant` before any balance change.
    ///
    /// When `mint_tokens` is set, one token is issued per crossing after the
    /// grant commits ("one token per crossing").
    pub async fn grant_for_crossing(
        &self,
        user_id: Uuid,
        rate: &ThresholdRate,
        period_start: DateTime<Utc>,
        referral_count: i64,
        mint_tokens: bool,
    ) -> Result<(RewardPoints, Vec<RewardToken>), Error> {
        let crossings = referral_count / i64::from(rate.referral_threshold);
        if crossings <= 0 {
            return Err(Error::Validation(format!(
                "Referral count {} is below the threshold {}",
                referral_count, rate.referral_threshold
            )));
        }
        let points = crossings * rate.points_per_threshold;

        let grant = PointGrant {
            grant_id: Uuid::new_v4(),
            user_id,
            pack_id: rate.pack_id,
            frequency: rate.frequency,
            period_start,
            referral_count,
            points,
            created_at: Utc::now(),
        };

        let mut tx = self.db.pool().begin().await?;
        if !self.points_repo.record_grant_in(&mut *tx, &grant).await? {
            drop(tx);
            return Err(Error::DuplicateGrant {
                user_id,
                pack_id: rate.pack_id,
                frequency: rate.frequency,
                period_start,
            });
        }

        let balance = self
            .points_repo
            .add_points_in(&mut *tx, user_id, rate.pack_id, points)
            .await?;

        let entry = HistoryEntry::new(
            user_id,
            HistoryAction::Attribution,
            format!(
                "{} points granted for {} referral threshold crossing(s)",
                points, rate.frequency
            ),
        )
        .with_metadata(json!({
            "pack_id": rate.pack_id,
            "frequency": rate.frequency,
            "period_start": period_start,
            "referral_count": referral_count,
            "referral_threshold": rate.referral_threshold,
            "crossings": crossings,
            "points": points,
        }));
        self.history_repo.record_in(&mut *tx, &entry).await?;
        tx.commit().await?;

        let mut tokens = Vec::new();
        if mint_tokens {
            for _ in 0..crossings {
                let token = self
                    .token_service
                    .issue_token(
                        user_id,
                        rate.pack_id,
                        Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
                    )
                    .await?;
                tokens.push(token);
            }
        }

        Ok((balance, tokens))
    }

    /// Converts `points` into wallet currency at the pack's **weekly** rate
    /// (deliberate simplification: points are always valued weekly, however
    /// they were earned).
    ///
    /// Ordering inside one transaction: conditional debit, conversion
    /// history entry, wallet credit, commit. A wallet failure therefore
    /// rolls the debit back, and the per-conversion idempotency key lets the
    /// wallet deduplicate a replayed credit if the commit is retried.
    pub async fn convert_to_wallet(
        &self,
        user_id: Uuid,
        pack_id: Uuid,
        points: i64,
    ) -> Result<f64, Error> {
        if points <= 0 {
            return Err(Error::Validation(format!(
                "Conversion must be positive, got {}",
                points
            )));
        }

        let rate = self
            .rate_repo
            .get(pack_id, Frequency::Weekly)
            .await?
            .ok_or(Error::NoRateConfigured {
                pack_id,
                frequency: Frequency::Weekly,
            })?;

        let available = self
            .points_repo
            .get(user_id, pack_id)
            .await?
            .map(|p| p.available_points)
            .unwrap_or(0);
        if points > available {
            return Err(Error::InsufficientPoints {
                requested: points,
                available,
            });
        }

        let amount = points as f64 * rate.currency_value_per_point;
        let idempotency_key = Uuid::new_v4();

        let mut tx = self.db.pool().begin().await?;
        if !self
            .points_repo
            .debit_in(&mut *tx, user_id, pack_id, points)
            .await?
        {
            // Lost a race with a concurrent conversion since the read above.
            drop(tx);
            let available = self
                .points_repo
                .get(user_id, pack_id)
                .await?
                .map(|p| p.available_points)
                .unwrap_or(0);
            return Err(Error::InsufficientPoints {
                requested: points,
                available,
            });
        }

        let entry = HistoryEntry::new(
            user_id,
            HistoryAction::Conversion,
            format!("{} points converted to wallet currency", points),
        )
        .with_metadata(json!({
            "pack_id": pack_id,
            "points": points,
            "rate_used": rate.currency_value_per_point,
            "rate_frequency": rate.frequency,
            "amount": amount,
            "idempotency_key": idempotency_key,
        }));
        self.history_repo.record_in(&mut *tx, &entry).await?;

        if let Err(e) = self
            .wallet
            .credit(
                user_id,
                amount,
                "bonus points conversion",
                idempotency_key,
                Some(json!({ "pack_id": pack_id, "points": points })),
            )
            .await
        {
            drop(tx);
            warn!(
                "Wallet credit failed for user {} ({} points): {:?}; debit rolled back",
                user_id, points, e
            );
            return Err(e);
        }

        tx.commit().await?;
        info!(
            "Converted {} points to {} for user {} (pack {})",
            points, amount, user_id, pack_id
        );
        Ok(amount)
    }
}
