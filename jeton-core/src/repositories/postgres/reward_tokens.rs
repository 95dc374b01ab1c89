// File: jeton-core/src/repositories/postgres/reward_tokens.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::token::{RewardToken, TokenFilter};
use jeton_common::traits::repository_traits::RewardTokenRepository;

#[derive(Clone)]
pub struct PostgresRewardTokenRepository {
    pool: Pool<Postgres>,
}

impl PostgresRewardTokenRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_token(r: &PgRow) -> Result<RewardToken, Error> {
    Ok(RewardToken {
        token_id: r.try_get("token_id")?,
        user_id: r.try_get("user_id")?,
        pack_id: r.try_get("pack_id")?,
        unique_code: r.try_get("unique_code")?,
        is_used: r.try_get("is_used")?,
        issued_at: r.try_get("issued_at")?,
        expires_at: r.try_get("expires_at")?,
        used_at: r.try_get("used_at")?,
        metadata: r.try_get("metadata")?,
    })
}

#[async_trait]
impl RewardTokenRepository for PostgresRewardTokenRepository {
    async fn insert_in(
        &self,
        conn: &mut PgConnection,
        token: &RewardToken,
    ) -> Result<bool, Error> {
        // ON CONFLICT DO NOTHING instead of catching the unique violation:
        // a violation would abort the surrounding transaction.
        let res = sqlx::query(
            r#"
            INSERT INTO reward_tokens (
                token_id, user_id, pack_id, unique_code,
                is_used, issued_at, expires_at, used_at, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (unique_code) DO NOTHING
            "#,
        )
        .bind(token.token_id)
        .bind(token.user_id)
        .bind(token.pack_id)
        .bind(&token.unique_code)
        .bind(token.is_used)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(&token.metadata)
        .execute(&mut *conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<RewardToken>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT token_id, user_id, pack_id, unique_code,
                   is_used, issued_at, expires_at, used_at, metadata
            FROM reward_tokens
            WHERE unique_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_token(&r)?)),
            None => Ok(None),
        }
    }

    async fn mark_used_in(
        &self,
        conn: &mut PgConnection,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let res = sqlx::query(
            r#"
            UPDATE reward_tokens
            SET is_used = TRUE, used_at = $2
            WHERE token_id = $1
              AND is_used = FALSE
              AND expires_at > $2
            "#,
        )
        .bind(token_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: TokenFilter,
    ) -> Result<Vec<RewardToken>, Error> {
        let condition = match filter {
            TokenFilter::Usable => "is_used = FALSE AND expires_at > $2",
            TokenFilter::Used => "is_used = TRUE AND $2 IS NOT NULL",
            TokenFilter::Expired => "is_used = FALSE AND expires_at <= $2",
        };
        let sql = format!(
            r#"
            SELECT token_id, user_id, pack_id, unique_code,
                   is_used, issued_at, expires_at, used_at, metadata
            FROM reward_tokens
            WHERE user_id = $1 AND {}
            ORDER BY issued_at DESC
            "#,
            condition
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(Utc::now())
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_token(&r)?);
        }
        Ok(list)
    }
}
