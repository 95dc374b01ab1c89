// File: jeton-core/src/repositories/postgres/reward_history.rs

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::history::{HistoryAction, HistoryEntry};
use jeton_common::traits::repository_traits::RewardHistoryRepository;

#[derive(Clone)]
pub struct PostgresRewardHistoryRepository {
    pool: Pool<Postgres>,
}

impl PostgresRewardHistoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_entry(r: &PgRow) -> Result<HistoryEntry, Error> {
    let action: String = r.try_get("action")?;
    Ok(HistoryEntry {
        entry_id: r.try_get("entry_id")?,
        user_id: r.try_get("user_id")?,
        token_id: r.try_get("token_id")?,
        ticket_id: r.try_get("ticket_id")?,
        prize_id: r.try_get("prize_id")?,
        action: HistoryAction::from_str(&action)?,
        description: r.try_get("description")?,
        metadata: r.try_get("metadata")?,
        created_at: r.try_get("created_at")?,
    })
}

const INSERT_SQL: &str = r#"
    INSERT INTO reward_history (
        entry_id, user_id, token_id, ticket_id, prize_id,
        action, description, metadata, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

#[async_trait]
impl RewardHistoryRepository for PostgresRewardHistoryRepository {
    async fn record(&self, entry: &HistoryEntry) -> Result<(), Error> {
        sqlx::query(INSERT_SQL)
            .bind(entry.entry_id)
            .bind(entry.user_id)
            .bind(entry.token_id)
            .bind(entry.ticket_id)
            .bind(entry.prize_id)
            .bind(entry.action.as_str())
            .bind(&entry.description)
            .bind(&entry.metadata)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_in(
        &self,
        conn: &mut PgConnection,
        entry: &HistoryEntry,
    ) -> Result<(), Error> {
        sqlx::query(INSERT_SQL)
            .bind(entry.entry_id)
            .bind(entry.user_id)
            .bind(entry.token_id)
            .bind(entry.ticket_id)
            .bind(entry.prize_id)
            .bind(entry.action.as_str())
            .bind(&entry.description)
            .bind(&entry.metadata)
            .bind(entry.created_at)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT entry_id, user_id, token_id, ticket_id, prize_id,
                   action, description, metadata, created_at
            FROM reward_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_entry(&r)?);
        }
        Ok(list)
    }

    async fn list_for_token(&self, token_id: Uuid) -> Result<Vec<HistoryEntry>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT entry_id, user_id, token_id, ticket_id, prize_id,
                   action, description, metadata, created_at
            FROM reward_history
            WHERE token_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(token_id)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_entry(&r)?);
        }
        Ok(list)
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<HistoryEntry>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT entry_id, user_id, token_id, ticket_id, prize_id,
                   action, description, metadata, created_at
            FROM reward_history
            WHERE ticket_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_entry(&r)?);
        }
        Ok(list)
    }
}
