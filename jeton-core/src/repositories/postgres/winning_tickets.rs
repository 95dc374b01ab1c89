// File: jeton-core/src/repositories/postgres/winning_tickets.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::ticket::WinningTicket;
use jeton_common::traits::repository_traits::WinningTicketRepository;

#[derive(Clone)]
pub struct PostgresWinningTicketRepository {
    pool: Pool<Postgres>,
}

impl PostgresWinningTicketRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_ticket(r: &PgRow) -> Result<WinningTicket, Error> {
    Ok(WinningTicket {
        ticket_id: r.try_get("ticket_id")?,
        user_id: r.try_get("user_id")?,
        prize_id: r.try_get("prize_id")?,
        source_token_code: r.try_get("source_token_code")?,
        issued_at: r.try_get("issued_at")?,
        expires_at: r.try_get("expires_at")?,
        consumed: r.try_get("consumed")?,
        consumed_at: r.try_get("consumed_at")?,
        verification_code: r.try_get("verification_code")?,
    })
}

#[async_trait]
impl WinningTicketRepository for PostgresWinningTicketRepository {
    async fn insert_in(
        &self,
        conn: &mut PgConnection,
        ticket: &WinningTicket,
    ) -> Result<bool, Error> {
        let res = sqlx::query(
            r#"
            INSERT INTO winning_tickets (
                ticket_id, user_id, prize_id, source_token_code,
                issued_at, expires_at, consumed, consumed_at, verification_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (verification_code) DO NOTHING
            "#,
        )
        .bind(ticket.ticket_id)
        .bind(ticket.user_id)
        .bind(ticket.prize_id)
        .bind(&ticket.source_token_code)
        .bind(ticket.issued_at)
        .bind(ticket.expires_at)
        .bind(ticket.consumed)
        .bind(ticket.consumed_at)
        .bind(&ticket.verification_code)
        .execute(&mut *conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn get_by_id(&self, ticket_id: Uuid) -> Result<Option<WinningTicket>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT ticket_id, user_id, prize_id, source_token_code,
                   issued_at, expires_at, consumed, consumed_at, verification_code
            FROM winning_tickets
            WHERE ticket_id = $1
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_ticket(&r)?)),
            None => Ok(None),
        }
    }

    async fn get_by_verification_code(
        &self,
        code: &str,
    ) -> Result<Option<WinningTicket>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT ticket_id, user_id, prize_id, source_token_code,
                   issued_at, expires_at, consumed, consumed_at, verification_code
            FROM winning_tickets
            WHERE verification_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_ticket(&r)?)),
            None => Ok(None),
        }
    }

    async fn consume_in(
        &self,
        conn: &mut PgConnection,
        ticket_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let res = sqlx::query(
            r#"
            UPDATE winning_tickets
            SET consumed = TRUE, consumed_at = $2
            WHERE ticket_id = $1
              AND consumed = FALSE
              AND expires_at > $2
            "#,
        )
        .bind(ticket_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WinningTicket>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT ticket_id, user_id, prize_id, source_token_code,
                   issued_at, expires_at, consumed, consumed_at, verification_code
            FROM winning_tickets
            WHERE user_id = $1
            ORDER BY issued_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_ticket(&r)?);
        }
        Ok(list)
    }
}
