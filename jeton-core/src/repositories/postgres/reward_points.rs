// File: jeton-core/src/repositories/postgres/reward_points.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::points::{PointGrant, RewardPoints};
use jeton_common::traits::repository_traits::RewardPointsRepository;

#[derive(Clone)]
pub struct PostgresRewardPointsRepository {
    pool: Pool<Postgres>,
}

impl PostgresRewardPointsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_points(r: &PgRow) -> Result<RewardPoints, Error> {
    Ok(RewardPoints {
        user_id: r.try_get("user_id")?,
        pack_id: r.try_get("pack_id")?,
        available_points: r.try_get("available_points")?,
        used_points: r.try_get("used_points")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl RewardPointsRepository for PostgresRewardPointsRepository {
    async fn get(&self, user_id: Uuid, pack_id: Uuid) -> Result<Option<RewardPoints>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT user_id, pack_id, available_points, used_points, created_at, updated_at
            FROM reward_points
            WHERE user_id = $1 AND pack_id = $2
            "#,
        )
        .bind(user_id)
        .bind(pack_id)
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_points(&r)?)),
            None => Ok(None),
        }
    }

    async fn add_points_in(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        pack_id: Uuid,
        points: i64,
    ) -> Result<RewardPoints, Error> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO reward_points (user_id, pack_id, available_points, used_points, created_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $4)
            ON CONFLICT (user_id, pack_id)
            DO UPDATE SET
                available_points = reward_points.available_points + EXCLUDED.available_points,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, pack_id, available_points, used_points, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(pack_id)
        .bind(points)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        row_to_points(&row)
    }

    async fn debit_in(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        pack_id: Uuid,
        points: i64,
    ) -> Result<bool, Error> {
        let res = sqlx::query(
            r#"
            UPDATE reward_points
            SET available_points = available_points - $3,
                used_points = used_points + $3,
                updated_at = $4
            WHERE user_id = $1
              AND pack_id = $2
              AND available_points >= $3
            "#,
        )
        .bind(user_id)
        .bind(pack_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn record_grant_in(
        &self,
        conn: &mut PgConnection,
        grant: &PointGrant,
    ) -> Result<bool, Error> {
        let res = sqlx::query(
            r#"
            INSERT INTO point_grants (
                grant_id, user_id, pack_id, frequency,
                period_start, referral_count, points, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, pack_id, frequency, period_start) DO NOTHING
            "#,
        )
        .bind(grant.grant_id)
        .bind(grant.user_id)
        .bind(grant.pack_id)
        .bind(grant.frequency.as_str())
        .bind(grant.period_start)
        .bind(grant.referral_count)
        .bind(grant.points)
        .bind(grant.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(res.rows_affected() == 1)
    }
}
