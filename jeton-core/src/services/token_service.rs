// File: jeton-core/src/services/token_service.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::history::{HistoryAction, HistoryEntry};
use jeton_common::models::token::{RewardToken, TokenFilter};
use jeton_common::traits::repository_traits::{RewardHistoryRepository, RewardTokenRepository};

use crate::db::Database;
use crate::utils::codes::generate_code;

/// Default lifetime of a freshly minted token.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

const CODE_PREFIX: &str = "JET";
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Mints single-use reward tokens and tracks their used/expired state.
pub struct TokenService {
    db: Database,
    token_repo: Arc<dyn RewardTokenRepository>,
    history_repo: Arc<dyn RewardHistoryRepository>,
}

impl TokenService {
    pub fn new(
        db: Database,
        token_repo: Arc<dyn RewardTokenRepository>,
        history_repo: Arc<dyn RewardHistoryRepository>,
    ) -> Self {
        Self {
            db,
            token_repo,
            history_repo,
        }
    }

    /// Mints a token with a code guaranteed unique by the store's unique
    /// index; on a collision we regenerate and retry a few times.
    pub async fn issue_token(
        &self,
        user_id: Uuid,
        pack_id: Uuid,
        ttl: Duration,
    ) -> Result<RewardToken, Error> {
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let now = Utc::now();
            let token = RewardToken {
                token_id: Uuid::new_v4(),
                user_id,
                pack_id,
                unique_code: generate_code(CODE_PREFIX, 3, 4),
                is_used: false,
                issued_at: now,
                expires_at: now + ttl,
                used_at: None,
                metadata: None,
            };

            let mut tx = self.db.pool().begin().await?;
            if !self.token_repo.insert_in(&mut *tx, &token).await? {
                drop(tx);
                warn!(
                    "Token code collision on '{}' (attempt {}), regenerating",
                    token.unique_code, attempt
                );
                continue;
            }

            let entry = HistoryEntry::new(
                user_id,
                HistoryAction::Attribution,
                format!("Reward token {} issued", token.unique_code),
            )
            .with_token(token.token_id)
            .with_metadata(json!({
                "pack_id": pack_id,
                "expires_at": token.expires_at,
            }));
            self.history_repo.record_in(&mut *tx, &entry).await?;
            tx.commit().await?;

            info!(
                "Issued token '{}' for user {} (pack {})",
                token.unique_code, user_id, pack_id
            );
            return Ok(token);
        }

        Err(Error::Validation(format!(
            "Could not generate a unique token code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }

    /// Resolves a code to its token, failing with the exact kind the caller
    /// must branch on. Expiration is computed from `now`, never stored.
    pub async fn validate(&self, code: &str) -> Result<RewardToken, Error> {
        let token = self
            .token_repo
            .get_by_code(code)
            .await?
            .ok_or_else(|| Error::TokenNotFound(code.to_string()))?;
        token.ensure_usable(Utc::now())?;
        Ok(token)
    }

    /// Marks a token used. The guard in the conditional UPDATE makes the
    /// loser of a double-redemption race fail here instead of silently
    /// succeeding.
    pub async fn mark_used(&self, token: &RewardToken) -> Result<(), Error> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        if !self
            .token_repo
            .mark_used_in(&mut *tx, token.token_id, now)
            .await?
        {
            drop(tx);
            debug!("mark_used guard failed for token '{}'", token.unique_code);
            // Re-read to report the precise reason.
            let current = self
                .token_repo
                .get_by_code(&token.unique_code)
                .await?
                .ok_or_else(|| Error::TokenNotFound(token.unique_code.clone()))?;
            current.ensure_usable(now)?;
            // Guard failed but the row looks usable: raced with a rollback.
            return Err(Error::TokenAlreadyUsed(token.unique_code.clone()));
        }

        let entry = HistoryEntry::new(
            token.user_id,
            HistoryAction::Utilisation,
            format!("Reward token {} marked used", token.unique_code),
        )
        .with_token(token.token_id);
        self.history_repo.record_in(&mut *tx, &entry).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_tokens(
        &self,
        user_id: Uuid,
        filter: TokenFilter,
    ) -> Result<Vec<RewardToken>, Error> {
        self.token_repo.list_for_user(user_id, filter).await
    }
}
