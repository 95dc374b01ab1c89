// File: jeton-core/src/repositories/postgres/prizes.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::prize::Prize;
use jeton_common::traits::repository_traits::PrizeRepository;

#[derive(Clone)]
pub struct PostgresPrizeRepository {
    pool: Pool<Postgres>,
}

impl PostgresPrizeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_prize(r: &PgRow) -> Result<Prize, Error> {
    Ok(Prize {
        prize_id: r.try_get("prize_id")?,
        pack_id: r.try_get("pack_id")?,
        name: r.try_get("name")?,
        description: r.try_get("description")?,
        image_ref: r.try_get("image_ref")?,
        value: r.try_get("value")?,
        draw_weight: r.try_get("draw_weight")?,
        stock: r.try_get("stock")?,
        is_active: r.try_get("is_active")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl PrizeRepository for PostgresPrizeRepository {
    async fn create(&self, prize: &Prize) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO prizes (
                prize_id, pack_id, name, description, image_ref,
                value, draw_weight, stock, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(prize.prize_id)
        .bind(prize.pack_id)
        .bind(&prize.name)
        .bind(&prize.description)
        .bind(&prize.image_ref)
        .bind(prize.value)
        .bind(prize.draw_weight)
        .bind(prize.stock)
        .bind(prize.is_active)
        .bind(prize.created_at)
        .bind(prize.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, prize: &Prize) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE prizes
            SET name = $2,
                description = $3,
                image_ref = $4,
                value = $5,
                draw_weight = $6,
                stock = $7,
                is_active = $8,
                updated_at = $9
            WHERE prize_id = $1
            "#,
        )
        .bind(prize.prize_id)
        .bind(&prize.name)
        .bind(&prize.description)
        .bind(&prize.image_ref)
        .bind(prize.value)
        .bind(prize.draw_weight)
        .bind(prize.stock)
        .bind(prize.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, prize_id: Uuid) -> Result<Option<Prize>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT prize_id, pack_id, name, description, image_ref,
                   value, draw_weight, stock, is_active, created_at, updated_at
            FROM prizes
            WHERE prize_id = $1
            "#,
        )
        .bind(prize_id)
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_prize(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_pack(&self, pack_id: Uuid) -> Result<Vec<Prize>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT prize_id, pack_id, name, description, image_ref,
                   value, draw_weight, stock, is_active, created_at, updated_at
            FROM prizes
            WHERE pack_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(pack_id)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_prize(&r)?);
        }
        Ok(list)
    }

    async fn list_drawable(&self, pack_id: Uuid) -> Result<Vec<Prize>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT prize_id, pack_id, name, description, image_ref,
                   value, draw_weight, stock, is_active, created_at, updated_at
            FROM prizes
            WHERE pack_id = $1
              AND is_active = TRUE
              AND stock > 0
            ORDER BY draw_weight DESC, prize_id ASC
            "#,
        )
        .bind(pack_id)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_prize(&r)?);
        }
        Ok(list)
    }

    async fn decrement_stock(&self, prize_id: Uuid) -> Result<bool, Error> {
        // Conditional atomic update, not read-then-write: concurrent draws
        // against the last unit race on this statement and exactly one wins.
        let res = sqlx::query(
            r#"
            UPDATE prizes
            SET stock = stock - 1, updated_at = $2
            WHERE prize_id = $1 AND stock > 0
            "#,
        )
        .bind(prize_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn increment_stock(&self, prize_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE prizes
            SET stock = stock + 1, updated_at = $2
            WHERE prize_id = $1
            "#,
        )
        .bind(prize_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
