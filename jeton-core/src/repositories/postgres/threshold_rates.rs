// File: jeton-core/src/repositories/postgres/threshold_rates.rs

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::threshold_rate::{Frequency, ThresholdRate};
use jeton_common::traits::repository_traits::ThresholdRateRepository;

#[derive(Clone)]
pub struct PostgresThresholdRateRepository {
    pool: Pool<Postgres>,
}

impl PostgresThresholdRateRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_rate(r: &PgRow) -> Result<ThresholdRate, Error> {
    let frequency: String = r.try_get("frequency")?;
    Ok(ThresholdRate {
        rate_id: r.try_get("rate_id")?,
        pack_id: r.try_get("pack_id")?,
        frequency: Frequency::from_str(&frequency)?,
        referral_threshold: r.try_get("referral_threshold")?,
        points_per_threshold: r.try_get("points_per_threshold")?,
        currency_value_per_point: r.try_get("currency_value_per_point")?,
        created_at: r.try_get("created_at")?,
    })
}

#[async_trait]
impl ThresholdRateRepository for PostgresThresholdRateRepository {
    async fn create(&self, rate: &ThresholdRate) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO threshold_rates (
                rate_id, pack_id, frequency, referral_threshold,
                points_per_threshold, currency_value_per_point, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(rate.rate_id)
        .bind(rate.pack_id)
        .bind(rate.frequency.as_str())
        .bind(rate.referral_threshold)
        .bind(rate.points_per_threshold)
        .bind(rate.currency_value_per_point)
        .bind(rate.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        pack_id: Uuid,
        frequency: Frequency,
    ) -> Result<Option<ThresholdRate>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT rate_id, pack_id, frequency, referral_threshold,
                   points_per_threshold, currency_value_per_point, created_at
            FROM threshold_rates
            WHERE pack_id = $1 AND frequency = $2
            "#,
        )
        .bind(pack_id)
        .bind(frequency.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_rate(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_pack(&self, pack_id: Uuid) -> Result<Vec<ThresholdRate>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT rate_id, pack_id, frequency, referral_threshold,
                   points_per_threshold, currency_value_per_point, created_at
            FROM threshold_rates
            WHERE pack_id = $1
            ORDER BY frequency ASC
            "#,
        )
        .bind(pack_id)
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_rate(&r)?);
        }
        Ok(list)
    }

    async fn list_all(&self) -> Result<Vec<ThresholdRate>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT rate_id, pack_id, frequency, referral_threshold,
                   points_per_threshold, currency_value_per_point, created_at
            FROM threshold_rates
            ORDER BY pack_id, frequency ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(row_to_rate(&r)?);
        }
        Ok(list)
    }
}
